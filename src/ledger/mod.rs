// Ledger module - THE OFFER REGISTRY
// Offers, the single-sale state machine, events, and the shared handle

mod amount;
mod book;
mod config;
mod error;
mod events;
mod handle;
mod offer;

pub use amount::{Amount, AmountError, DISPLAY_DECIMALS};
pub use book::OfferBook;
pub use config::{AccessPolicy, LedgerConfig, ListingPolicy, PaymentPolicy, MAX_EVENT_CAPACITY};
pub use error::LedgerError;
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use handle::{Ledger, LedgerStatistics};
pub use offer::{Offer, OfferId, OfferPage, Purchase};
