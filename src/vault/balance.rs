// Balance tracking - what each account holds
//
// Changes are planned first (`plan_*` returns the resulting balances without
// touching state) and applied afterwards, so a caller can persist the plan
// before committing it in memory.

use crate::identity::AccountId;
use crate::ledger::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during balance operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Invalid amount")]
    InvalidAmount,
}

/// New balance of one account after a planned change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub account: AccountId,
    pub balance: Amount,
}

/// Balances of every account the ledger has seen
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Balances {
    accounts: BTreeMap<AccountId, Amount>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_updates<I: IntoIterator<Item = BalanceUpdate>>(updates: I) -> Self {
        let mut balances = Self::new();
        balances.apply(updates);
        balances
    }

    /// Balance of an account (zero if never funded)
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    pub fn can_afford(&self, account: &AccountId, amount: Amount) -> bool {
        self.balance_of(account) >= amount
    }

    /// Sum of all balances (`None` on overflow)
    pub fn total(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(Amount::ZERO, |acc, v| acc.checked_add(*v))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Plan crediting `amount` to `account`
    pub fn plan_deposit(&self, account: &AccountId, amount: Amount) -> Result<BalanceUpdate, BalanceError> {
        if amount.is_zero() {
            return Err(BalanceError::InvalidAmount);
        }
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(BalanceError::BalanceOverflow)?;
        Ok(BalanceUpdate {
            account: *account,
            balance,
        })
    }

    /// Plan moving `amount` from `from` to `to`
    ///
    /// `hold` is what `from` must have on hand, which can be more than what is
    /// moved (an attached payment whose excess is refunded).
    pub fn plan_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        hold: Amount,
    ) -> Result<Vec<BalanceUpdate>, BalanceError> {
        let available = self.balance_of(from);
        let required = hold.max(amount);
        if available < required {
            return Err(BalanceError::InsufficientBalance { available, required });
        }

        if from == to {
            return Ok(vec![BalanceUpdate {
                account: *from,
                balance: available,
            }]);
        }

        let debited = available
            .checked_sub(amount)
            .ok_or(BalanceError::InsufficientBalance { available, required })?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(BalanceError::BalanceOverflow)?;

        Ok(vec![
            BalanceUpdate {
                account: *from,
                balance: debited,
            },
            BalanceUpdate {
                account: *to,
                balance: credited,
            },
        ])
    }

    /// Apply planned updates
    pub(crate) fn apply<I: IntoIterator<Item = BalanceUpdate>>(&mut self, updates: I) {
        for update in updates {
            self.accounts.insert(update.account, update.balance);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.accounts.iter()
    }
}
