// Ledger events - what observers see after each committed mutation

use crate::identity::AccountId;
use crate::ledger::{Amount, OfferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    OfferCreated {
        id: OfferId,
        seller: AccountId,
        description: String,
        price: Amount,
    },
    OfferSold {
        id: OfferId,
        buyer: AccountId,
        description: String,
        price: Amount,
    },
    FundsDeposited {
        account: AccountId,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::OfferCreated { .. } => "OfferCreated",
            LedgerEvent::OfferSold { .. } => "OfferSold",
            LedgerEvent::FundsDeposited { .. } => "FundsDeposited",
        }
    }

    /// The offer this event concerns, if any
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            LedgerEvent::OfferCreated { id, .. } | LedgerEvent::OfferSold { id, .. } => Some(*id),
            LedgerEvent::FundsDeposited { .. } => None,
        }
    }
}

/// An event with its position in the log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// Append-only event history, dense sequence numbers from 0
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored records; `None` if the sequence has gaps
    pub fn from_records(records: Vec<EventRecord>) -> Option<Self> {
        let dense = records
            .iter()
            .enumerate()
            .all(|(i, r)| r.sequence == i as u64);
        dense.then_some(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence number the next record will get
    pub fn next_sequence(&self) -> u64 {
        self.records.len() as u64
    }

    /// Wrap an event as the next record without appending it
    pub fn stamp(&self, event: LedgerEvent) -> EventRecord {
        EventRecord {
            sequence: self.next_sequence(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub(crate) fn append(&mut self, record: EventRecord) {
        debug_assert_eq!(record.sequence, self.next_sequence());
        self.records.push(record);
    }

    /// Records with `sequence >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.records.len());
        &self.records[start..]
    }
}
