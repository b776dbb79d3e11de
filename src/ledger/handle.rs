// Ledger - the shared handle every caller goes through
//
// All mutations take the write lock, so they form a single total order.
// Each one runs validate -> store commit -> in-memory apply -> flush ->
// broadcast, and any failure before apply leaves the ledger untouched.

use crate::identity::AccountId;
use crate::ledger::{
    Amount, EventLog, EventRecord, LedgerConfig, LedgerError, LedgerEvent, Offer, OfferBook, OfferId,
    OfferPage, Purchase, MAX_EVENT_CAPACITY,
};
use crate::storage::{Commit, LedgerStore, StoreError};
use crate::vault::Balances;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Snapshot statistics about the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub total_offers: usize,
    pub available_offers: usize,
    pub funded_accounts: usize,
    pub events: usize,
    /// Sum of all balances (`None` on overflow)
    pub total_funds: Option<Amount>,
}

#[derive(Debug, Default)]
struct LedgerState {
    book: OfferBook,
    balances: Balances,
    events: EventLog,
}

struct Shared {
    state: RwLock<LedgerState>,
    config: LedgerConfig,
    store: Option<LedgerStore>,
    events_tx: broadcast::Sender<EventRecord>,
}

/// Handle to one offer ledger; clones share the same state
#[derive(Clone)]
pub struct Ledger {
    shared: Arc<Shared>,
}

impl Ledger {
    /// A ledger that lives only in memory
    pub fn new(config: LedgerConfig) -> Self {
        Self::from_parts(LedgerState::default(), config, None)
    }

    /// A ledger backed by `store`, resuming whatever it already holds
    pub fn open(store: LedgerStore, config: LedgerConfig) -> Result<Self, LedgerError> {
        let book = OfferBook::from_offers(store.load_offers()?)
            .ok_or_else(|| StoreError::Corrupt("offer ids are not dense".into()))?;
        let balances = Balances::from_updates(store.load_balances()?);
        let events = EventLog::from_records(store.load_events()?)
            .ok_or_else(|| StoreError::Corrupt("event sequence has gaps".into()))?;

        debug!(
            offers = book.len(),
            accounts = balances.account_count(),
            events = events.len(),
            "loaded ledger from store"
        );

        let state = LedgerState { book, balances, events };
        Ok(Self::from_parts(state, config, Some(store)))
    }

    fn from_parts(state: LedgerState, config: LedgerConfig, store: Option<LedgerStore>) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                config,
                store,
                events_tx,
            }),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.shared.config
    }

    pub fn is_persistent(&self) -> bool {
        self.shared.store.is_some()
    }

    // Mutations are applied only after validation and the store commit
    // succeed, so a poisoned lock still guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.shared.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.shared.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, commit: Commit<'_>) -> Result<(), LedgerError> {
        if let Some(store) = &self.shared.store {
            store.commit(&commit)?;
        }
        Ok(())
    }

    // Runs after the in-memory apply. The commit is already in the database,
    // so a failed flush is reported, not undone.
    fn sync(&self) {
        if let Some(store) = &self.shared.store {
            if let Err(e) = store.flush() {
                error!(error = %e, "ledger flush failed; last commit may not survive a crash");
            }
        }
    }

    fn publish(&self, record: EventRecord) {
        // No receivers is not an error; observers may poll the log instead.
        let _ = self.shared.events_tx.send(record);
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// List a new offer sold by `seller`; returns its id
    pub fn create_offer(
        &self,
        seller: &AccountId,
        description: impl Into<String>,
        price: Amount,
    ) -> Result<OfferId, LedgerError> {
        let config = &self.shared.config;
        let description = description.into();
        let mut state = self.write();

        let offer = config
            .access
            .check(seller)
            .and_then(|_| state.book.plan_create(seller, description, price, &config.listing))
            .inspect_err(|e| warn!(%seller, error = %e, "create_offer rejected"))?;

        let record = state.events.stamp(LedgerEvent::OfferCreated {
            id: offer.id(),
            seller: *seller,
            description: offer.description().to_string(),
            price,
        });
        self.persist(Commit {
            offer: Some(&offer),
            balances: &[],
            event: &record,
        })?;

        let id = offer.id();
        state.book.insert(offer);
        state.events.append(record.clone());
        self.sync();
        self.publish(record);

        info!(id = %id, %seller, %price, "offer created");
        Ok(id)
    }

    /// Buy offer `id` with `payment` taken from the buyer's balance
    ///
    /// The availability flag is flipped before the transfer is applied, and
    /// both happen under the same write lock as the availability check.
    pub fn buy_offer(&self, buyer: &AccountId, id: OfferId, payment: Amount) -> Result<Purchase, LedgerError> {
        let config = &self.shared.config;
        let mut state = self.write();

        let planned = config
            .access
            .check(buyer)
            .and_then(|_| state.book.plan_purchase(id, buyer, payment, config.payment))
            .and_then(|purchase| {
                let updates = state
                    .balances
                    .plan_transfer(buyer, &purchase.seller, purchase.price, payment)?;
                Ok((purchase, updates))
            });
        let (purchase, updates) = planned.inspect_err(|e| warn!(id = %id, %buyer, error = %e, "buy_offer rejected"))?;

        let mut sold = state.book.get(id)?.clone();
        sold.mark_sold();
        let record = state.events.stamp(LedgerEvent::OfferSold {
            id,
            buyer: *buyer,
            description: purchase.description.clone(),
            price: purchase.price,
        });
        self.persist(Commit {
            offer: Some(&sold),
            balances: &updates,
            event: &record,
        })?;

        state.book.mark_sold(id)?;
        state.balances.apply(updates);
        state.events.append(record.clone());
        self.sync();
        self.publish(record);

        info!(
            id = %id,
            %buyer,
            seller = %purchase.seller,
            price = %purchase.price,
            refund = %purchase.refund,
            "offer sold"
        );
        Ok(purchase)
    }

    /// Credit `amount` to `account`; returns the new balance
    pub fn deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let mut state = self.write();

        let update = state
            .balances
            .plan_deposit(account, amount)
            .inspect_err(|e| warn!(%account, error = %e, "deposit rejected"))?;

        let record = state.events.stamp(LedgerEvent::FundsDeposited {
            account: *account,
            amount,
        });
        self.persist(Commit {
            offer: None,
            balances: std::slice::from_ref(&update),
            event: &record,
        })?;

        state.balances.apply([update]);
        state.events.append(record.clone());
        self.sync();
        self.publish(record);

        info!(%account, %amount, balance = %update.balance, "funds deposited");
        Ok(update.balance)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_offer(&self, id: OfferId) -> Result<Offer, LedgerError> {
        let offer = self.read().book.get(id).cloned();
        if offer.is_err() {
            debug!(id = %id, "get_offer out of range");
        }
        offer
    }

    /// Number of offers ever created
    pub fn next_offer_id(&self) -> OfferId {
        self.read().book.next_offer_id()
    }

    /// One page of offers starting at id `offset`
    ///
    /// `limit` is clamped to `1..=max_page_size`. An offset past the end gives
    /// an empty page rather than an error.
    pub fn list_offers(&self, offset: u64, limit: usize) -> OfferPage {
        let limit = limit.clamp(1, self.shared.config.max_page_size.max(1));
        self.read().book.page(offset, limit)
    }

    /// Every offer, gathered page by page
    pub fn all_offers(&self) -> Vec<Offer> {
        let mut offers = Vec::new();
        let mut offset = Some(0);
        while let Some(start) = offset {
            let page = self.list_offers(start, self.shared.config.max_page_size);
            offers.extend(page.offers);
            offset = page.next_offset;
        }
        offers
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.read().balances.balance_of(account)
    }

    /// Live stream of events committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.shared.events_tx.subscribe()
    }

    /// Logged events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.read().events.since(from).to_vec()
    }

    pub fn statistics(&self) -> LedgerStatistics {
        let state = self.read();
        LedgerStatistics {
            total_offers: state.book.len(),
            available_offers: state.book.available_count(),
            funded_accounts: state.balances.account_count(),
            events: state.events.len(),
            total_funds: state.balances.total(),
        }
    }
}
