// Store Tests
// Tests for the sled-backed ledger store and durable ledgers

use offer_ledger::identity::Keypair;
use offer_ledger::ledger::{Amount, Ledger, LedgerConfig, LedgerError, LedgerEvent, OfferId};
use offer_ledger::storage::{LedgerStore, StoreError};
use tempfile::TempDir;

fn eth(s: &str) -> Amount {
    Amount::parse_decimal(s).unwrap()
}

// ============================================================================
// STORE CREATION AND BASIC OPERATIONS
// ============================================================================

/// Test: Store open new
#[test]
fn test_store_open_new() {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path()).unwrap();

    assert!(store.is_empty().unwrap());
}

/// Test: Store open existing
#[test]
fn test_store_open_existing() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        store.put_raw(b"test_key", b"test_value").unwrap();
        store.flush().unwrap();
    }

    {
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let value = store.get_raw(b"test_key").unwrap();
        assert_eq!(value, Some(b"test_value".to_vec()));
    }
}

/// Test: Store get nonexistent
#[test]
fn test_store_get_nonexistent() {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path()).unwrap();

    assert_eq!(store.get_raw(b"nonexistent").unwrap(), None);
}

// ============================================================================
// KEYPAIRS
// ============================================================================

/// Test: Keypair by label
#[test]
fn test_keypair_by_label() {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path()).unwrap();
    let alice = Keypair::generate();
    let bob = Keypair::generate();

    store.save_keypair_with_label(&alice, "alice").unwrap();
    store.save_keypair_with_label(&bob, "bob").unwrap();

    let loaded = store.load_keypair_with_label("alice").unwrap().unwrap();
    assert_eq!(loaded.account_id(), alice.account_id());
    assert!(store.load_keypair_with_label("carol").unwrap().is_none());
    assert_eq!(store.keypair_labels().unwrap(), vec!["alice".to_string(), "bob".to_string()]);
}

/// Test: Corrupt keypair is reported
#[test]
fn test_corrupt_keypair_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path()).unwrap();

    store.put_raw(b"identity:keypair:broken", b"short").unwrap();

    assert!(matches!(
        store.load_keypair_with_label("broken"),
        Err(StoreError::DeserializationFailed(_))
    ));
}

// ============================================================================
// DURABLE LEDGER
// ============================================================================

/// Test: Mutations are written through
#[test]
fn test_mutations_are_written_through() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Ledger::open(LedgerStore::open(temp_dir.path()).unwrap(), LedgerConfig::default()).unwrap();
    let seller = Keypair::generate().account_id();

    ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();

    assert!(ledger.is_persistent());
    drop(ledger);

    let store = LedgerStore::open(temp_dir.path()).unwrap();
    let offer = store.load_offer(OfferId::new(0)).unwrap().unwrap();
    assert_eq!(offer.description(), "Paris Trip");
    assert_eq!(store.load_events().unwrap().len(), 1);
}

/// Test: Reopening the store gives back offers, balances and the event log
#[test]
fn test_ledger_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let seller = Keypair::generate().account_id();
    let buyer = Keypair::generate().account_id();

    {
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let ledger = Ledger::open(store, LedgerConfig::default()).unwrap();
        ledger.deposit(&buyer, eth("3")).unwrap();
        ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();
        ledger.create_offer(&seller, "Rome Trip", eth("2")).unwrap();
        ledger.buy_offer(&buyer, OfferId::new(1), eth("2")).unwrap();
    }

    let store = LedgerStore::open(temp_dir.path()).unwrap();
    let ledger = Ledger::open(store, LedgerConfig::default()).unwrap();

    assert_eq!(ledger.next_offer_id(), OfferId::new(2));
    assert!(ledger.get_offer(OfferId::new(0)).unwrap().is_available());
    assert!(!ledger.get_offer(OfferId::new(1)).unwrap().is_available());
    assert_eq!(ledger.balance_of(&buyer), eth("1"));
    assert_eq!(ledger.balance_of(&seller), eth("2"));

    let events = ledger.events_since(0);
    assert_eq!(events.len(), 4);
    assert!(matches!(events[3].event, LedgerEvent::OfferSold { id, .. } if id == OfferId::new(1)));

    // The reopened ledger keeps counting from where it left off
    let id = ledger.create_offer(&seller, "Oslo Trip", eth("1")).unwrap();
    assert_eq!(id, OfferId::new(2));
    assert_eq!(ledger.events_since(0).last().unwrap().sequence, 4);
}

/// Test: A sold offer stays sold after reopening
#[test]
fn test_no_resale_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let seller = Keypair::generate().account_id();
    let buyer = Keypair::generate().account_id();

    {
        let ledger = Ledger::open(LedgerStore::open(temp_dir.path()).unwrap(), LedgerConfig::default()).unwrap();
        ledger.deposit(&buyer, eth("2")).unwrap();
        let id = ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();
        ledger.buy_offer(&buyer, id, eth("1")).unwrap();
    }

    let ledger = Ledger::open(LedgerStore::open(temp_dir.path()).unwrap(), LedgerConfig::default()).unwrap();
    assert!(matches!(
        ledger.buy_offer(&buyer, OfferId::new(0), eth("1")),
        Err(LedgerError::AlreadySold { .. })
    ));
    assert_eq!(ledger.balance_of(&buyer), eth("1"));
}

/// Test: Rejected mutations leave nothing behind on disk
#[test]
fn test_rejected_mutation_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Ledger::open(LedgerStore::open(temp_dir.path()).unwrap(), LedgerConfig::default()).unwrap();
    let seller = Keypair::generate().account_id();
    let buyer = Keypair::generate().account_id();
    let id = ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();

    assert!(ledger.buy_offer(&buyer, id, eth("1")).is_err());
    drop(ledger);

    let store = LedgerStore::open(temp_dir.path()).unwrap();
    assert!(store.load_offer(id).unwrap().unwrap().is_available());
    assert!(store.load_balances().unwrap().is_empty());
    assert_eq!(store.load_events().unwrap().len(), 1);
}

/// Test: A failed store commit leaves both the ledger and the database unchanged
#[test]
fn test_failed_commit_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = LedgerStore::open(temp_dir.path()).unwrap();
    let ledger = Ledger::open(store.clone(), LedgerConfig::default()).unwrap();
    let seller = Keypair::generate().account_id();
    let buyer = Keypair::generate().account_id();
    ledger.deposit(&buyer, eth("1")).unwrap();
    let id = ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();

    // Occupy the next event slot so the sale's transaction aborts
    let next_event = [b"event:".as_slice(), &2u64.to_be_bytes()].concat();
    store.put_raw(&next_event, b"taken").unwrap();
    let mut events = ledger.subscribe();

    let result = ledger.buy_offer(&buyer, id, eth("1"));

    assert!(matches!(
        result,
        Err(LedgerError::Storage(StoreError::Corrupt(_)))
    ));
    assert!(ledger.get_offer(id).unwrap().is_available());
    assert_eq!(ledger.balance_of(&buyer), eth("1"));
    assert_eq!(ledger.balance_of(&seller), Amount::ZERO);
    assert_eq!(ledger.events_since(0).len(), 2);
    assert!(events.try_recv().is_err());

    assert!(store.load_offer(id).unwrap().unwrap().is_available());
    assert_eq!(store.load_balances().unwrap().len(), 1);
    assert_eq!(store.get_raw(&next_event).unwrap(), Some(b"taken".to_vec()));
}

/// Test: Offer ids with gaps are reported as corruption on open
#[test]
fn test_non_dense_offers_are_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    {
        let ledger = Ledger::open(LedgerStore::open(temp_dir.path()).unwrap(), LedgerConfig::default()).unwrap();
        let seller = Keypair::generate().account_id();
        ledger.create_offer(&seller, "Paris Trip", eth("1")).unwrap();
    }

    let store = LedgerStore::open(temp_dir.path()).unwrap();
    // Duplicate offer 0 under the key of offer 5
    let offer_zero = [b"offer:".as_slice(), &0u64.to_be_bytes()].concat();
    let offer_five = [b"offer:".as_slice(), &5u64.to_be_bytes()].concat();
    let bytes = store.get_raw(&offer_zero).unwrap().unwrap();
    store.put_raw(&offer_five, &bytes).unwrap();

    let result = Ledger::open(store, LedgerConfig::default());
    assert!(matches!(
        result,
        Err(LedgerError::Storage(StoreError::Corrupt(_)))
    ));
}
