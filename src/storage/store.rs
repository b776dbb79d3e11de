// LedgerStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - Offers (one record per offer id)
// - Account balances
// - The event log
// - Labelled account keypairs

use crate::identity::{AccountId, Keypair};
use crate::ledger::{Amount, EventRecord, Offer, OfferId};
use crate::vault::BalanceUpdate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const OFFER_PREFIX: &[u8] = b"offer:";
    pub const BALANCE_PREFIX: &[u8] = b"balance:";
    pub const EVENT_PREFIX: &[u8] = b"event:";
    pub const KEYPAIR_PREFIX: &[u8] = b"identity:keypair:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Stored ledger is corrupt: {0}")]
    Corrupt(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Everything one ledger mutation writes, committed as a single transaction
#[derive(Clone, Copy, Debug)]
pub struct Commit<'a> {
    pub offer: Option<&'a Offer>,
    pub balances: &'a [BalanceUpdate],
    pub event: &'a EventRecord,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}

fn offer_key(id: OfferId) -> Vec<u8> {
    [keys::OFFER_PREFIX, &id.to_be_bytes()].concat()
}

fn balance_key(account: &AccountId) -> Vec<u8> {
    [keys::BALANCE_PREFIX, account.as_bytes()].concat()
}

fn event_key(sequence: u64) -> Vec<u8> {
    [keys::EVENT_PREFIX, &sequence.to_be_bytes()].concat()
}

/// Persistent store for ledger data
///
/// Uses sled for crash-safe, embedded storage. `commit` writes every record
/// of a mutation in one transaction; `flush` makes it survive a crash.
/// Clones share the same database.
#[derive(Clone)]
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, T)>, StoreError> {
        let mut items = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, value) = result?;
            items.push((key[prefix.len()..].to_vec(), decode(&value)?));
        }
        Ok(items)
    }

    // ========================================================================
    // LEDGER PERSISTENCE
    // ========================================================================

    /// Write one mutation atomically
    ///
    /// The event log is append-only: if the event's sequence is already
    /// stored the transaction aborts and nothing is written. A successful
    /// commit is applied to the database but not yet flushed.
    pub fn commit(&self, commit: &Commit<'_>) -> Result<(), StoreError> {
        let mut writes: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(commit.balances.len() + 1);
        if let Some(offer) = commit.offer {
            writes.push((offer_key(offer.id()), encode(offer)?));
        }
        for update in commit.balances {
            writes.push((balance_key(&update.account), encode(&update.balance)?));
        }
        let sequence = commit.event.sequence;
        let event = (event_key(sequence), encode(commit.event)?);

        let result: TransactionResult<(), u64> = self.db.transaction(|tx| {
            if tx.get(event.0.as_slice())?.is_some() {
                return Err(ConflictableTransactionError::Abort(sequence));
            }
            for (key, value) in &writes {
                tx.insert(key.as_slice(), value.as_slice())?;
            }
            tx.insert(event.0.as_slice(), event.1.as_slice())?;
            Ok(())
        });

        result.map_err(|e| match e {
            TransactionError::Abort(sequence) => {
                StoreError::Corrupt(format!("event {} is already stored", sequence))
            }
            TransactionError::Storage(e) => StoreError::CommitFailed(e.to_string()),
        })
    }

    /// All stored offers, in id order
    pub fn load_offers(&self) -> Result<Vec<Offer>, StoreError> {
        Ok(self
            .scan::<Offer>(keys::OFFER_PREFIX)?
            .into_iter()
            .map(|(_, offer)| offer)
            .collect())
    }

    pub fn load_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        self.get_raw(&offer_key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn load_balances(&self) -> Result<Vec<BalanceUpdate>, StoreError> {
        self.scan::<Amount>(keys::BALANCE_PREFIX)?
            .into_iter()
            .map(|(suffix, balance)| {
                let bytes: [u8; 32] = suffix.as_slice().try_into().map_err(|_| {
                    StoreError::Corrupt(format!("balance key of {} bytes", suffix.len()))
                })?;
                Ok(BalanceUpdate {
                    account: AccountId::from_bytes(bytes),
                    balance,
                })
            })
            .collect()
    }

    /// The event log, in sequence order
    pub fn load_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .scan::<EventRecord>(keys::EVENT_PREFIX)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    // ========================================================================
    // IDENTITY PERSISTENCE
    // ========================================================================

    pub fn save_keypair_with_label(&self, keypair: &Keypair, label: &str) -> Result<(), StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.put_raw(&key, &keypair.to_bytes())?;
        self.flush()
    }

    pub fn load_keypair_with_label(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Labels of all stored keypairs, sorted
    pub fn keypair_labels(&self) -> Result<Vec<String>, StoreError> {
        let mut labels = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, _) = result?;
            let label = String::from_utf8_lossy(&key[keys::KEYPAIR_PREFIX.len()..]).into_owned();
            labels.push(label);
        }
        Ok(labels)
    }
}
