use crate::identity::AccountId;
use crate::ledger::{Amount, OfferId};
use crate::storage::StoreError;
use crate::vault::BalanceError;
use thiserror::Error;

/// Errors surfaced by ledger operations
///
/// Every mutating operation that returns one of these has left the ledger
/// exactly as it found it.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Offer {id} not found")]
    NotFound { id: OfferId },

    #[error("Offer {id} already sold")]
    AlreadySold { id: OfferId },

    #[error("Wrong payment amount: price {expected}, provided {provided}")]
    WrongAmount { expected: Amount, provided: Amount },

    #[error("Account {0} is not authorized")]
    Unauthorized(AccountId),

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid offer: {0}")]
    InvalidOffer(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<BalanceError> for LedgerError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InsufficientBalance { available, required } => {
                LedgerError::InsufficientFunds { available, required }
            }
            BalanceError::BalanceOverflow => LedgerError::BalanceOverflow,
            BalanceError::InvalidAmount => LedgerError::InvalidAmount,
        }
    }
}
