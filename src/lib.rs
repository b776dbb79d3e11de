//! Marketplace offer ledger.
//!
//! Sellers list offers (a description and a price); buyers purchase them
//! with funds from their account balance. Each offer sells at most once, and
//! every mutation is serialized, durably committed, and announced as an event.

pub mod identity;
pub mod ledger;
pub mod storage;
pub mod vault;

pub use identity::{AccountId, Keypair};
pub use ledger::{Amount, Ledger, LedgerConfig, LedgerError, Offer, OfferId};
