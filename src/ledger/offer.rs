use crate::identity::AccountId;
use crate::ledger::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential offer identifier, starting at 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(u64);

impl OfferId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, so storage keys sort in id order
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for OfferId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listed item, sellable at most once
///
/// Only `available` ever changes, and only from `true` to `false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    seller: AccountId,
    description: String,
    price: Amount,
    available: bool,
}

impl Offer {
    pub(crate) fn new(id: OfferId, seller: AccountId, description: String, price: Amount) -> Self {
        Self {
            id,
            seller,
            description,
            price,
            available: true,
        }
    }

    pub fn id(&self) -> OfferId {
        self.id
    }

    pub fn seller(&self) -> &AccountId {
        &self.seller
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub(crate) fn mark_sold(&mut self) {
        self.available = false;
    }
}

/// One page of a `list_offers` scan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferPage {
    pub offers: Vec<Offer>,
    /// Offers ever created at the time of the read
    pub total: u64,
    /// Where the next page starts, or `None` when the scan is complete
    pub next_offset: Option<u64>,
}

/// Receipt of a successful purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub offer_id: OfferId,
    pub seller: AccountId,
    pub buyer: AccountId,
    pub description: String,
    pub price: Amount,
    /// Excess payment handed back to the buyer (zero under exact payment)
    pub refund: Amount,
}
