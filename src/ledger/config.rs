// Ledger configuration - listing, payment and access policies

use crate::identity::AccountId;
use crate::ledger::{Amount, LedgerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How `buy_offer` treats a payment that differs from the price
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPolicy {
    /// Payment must equal the price; anything else is `WrongAmount`
    #[default]
    Exact,
    /// Payment may exceed the price; the buyer is charged the price and the
    /// excess stays with them in the same commit
    RefundExcess,
}

impl PaymentPolicy {
    /// Returns the refund owed for `payment` against `price`
    pub fn settle(&self, price: Amount, payment: Amount) -> Result<Amount, LedgerError> {
        let wrong = || LedgerError::WrongAmount {
            expected: price,
            provided: payment,
        };
        match self {
            PaymentPolicy::Exact if payment == price => Ok(Amount::ZERO),
            PaymentPolicy::Exact => Err(wrong()),
            PaymentPolicy::RefundExcess => payment.checked_sub(price).ok_or_else(wrong),
        }
    }
}

/// Who may call the mutating operations
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    /// Any account may create and buy
    #[default]
    Open,
    /// Only the listed accounts may create and buy
    AllowList(BTreeSet<AccountId>),
}

impl AccessPolicy {
    pub fn check(&self, caller: &AccountId) -> Result<(), LedgerError> {
        match self {
            AccessPolicy::Open => Ok(()),
            AccessPolicy::AllowList(allowed) if allowed.contains(caller) => Ok(()),
            AccessPolicy::AllowList(_) => Err(LedgerError::Unauthorized(*caller)),
        }
    }
}

/// Validation applied to new offers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPolicy {
    pub allow_empty_description: bool,
    pub allow_zero_price: bool,
    /// Maximum description length in bytes; unlimited when `None`
    pub max_description_len: Option<usize>,
}

impl Default for ListingPolicy {
    fn default() -> Self {
        Self {
            allow_empty_description: true,
            allow_zero_price: true,
            max_description_len: None,
        }
    }
}

impl ListingPolicy {
    pub fn check(&self, description: &str, price: Amount) -> Result<(), LedgerError> {
        if !self.allow_empty_description && description.trim().is_empty() {
            return Err(LedgerError::InvalidOffer("description is empty".into()));
        }
        if let Some(limit) = self.max_description_len {
            if description.len() > limit {
                return Err(LedgerError::InvalidOffer(format!(
                    "description is {} bytes, limit is {}",
                    description.len(),
                    limit
                )));
            }
        }
        if !self.allow_zero_price && price.is_zero() {
            return Err(LedgerError::InvalidOffer("price is zero".into()));
        }
        Ok(())
    }
}

/// Upper bound on `event_capacity`; the live buffer is allocated up front
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Configuration for a ledger instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub listing: ListingPolicy,
    pub payment: PaymentPolicy,
    pub access: AccessPolicy,
    /// Upper bound on offers returned by one `list_offers` call
    pub max_page_size: usize,
    /// Buffered events per live subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            listing: ListingPolicy::default(),
            payment: PaymentPolicy::default(),
            access: AccessPolicy::default(),
            max_page_size: 100,
            event_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment_policy(mut self, payment: PaymentPolicy) -> Self {
        self.payment = payment;
        self
    }

    pub fn with_access_policy(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    pub fn with_listing_policy(mut self, listing: ListingPolicy) -> Self {
        self.listing = listing;
        self
    }

    pub fn reject_empty_descriptions(mut self) -> Self {
        self.listing.allow_empty_description = false;
        self
    }

    pub fn reject_zero_prices(mut self) -> Self {
        self.listing.allow_zero_price = false;
        self
    }

    pub fn with_max_description_len(mut self, limit: usize) -> Self {
        self.listing.max_description_len = Some(limit);
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.clamp(1, MAX_EVENT_CAPACITY);
        self
    }
}
