// Storage module - PERSISTENCE
// Durable ledger state using sled

mod store;

pub use store::{Commit, LedgerStore, StoreError};
