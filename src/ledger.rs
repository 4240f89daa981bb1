//! The in-memory transaction ledger.
//!
//! A single owned value shared across the sync engine. All updates go
//! through one mutation entry point ([`Ledger::replace`]) which swaps the
//! whole vector and persists it best-effort through the store; components
//! never mutate individual fields in place. This bounds interleaving races
//! to whole-ledger replacement, and "last write wins" is the documented
//! consistency model.

use std::sync::{Arc, Mutex};

use crate::models::{LedgerStats, Transaction};
use crate::store::Store;

/// Shared, persistently-backed transaction ledger.
pub struct Ledger {
    store: Arc<Mutex<Store>>,
    transactions: Mutex<Vec<Transaction>>,
}

impl Ledger {
    /// Create an empty ledger backed by the given store.
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self {
            store,
            transactions: Mutex::new(Vec::new()),
        }
    }

    /// Replace the in-memory ledger from the persisted blob.
    pub fn load(&self) {
        let loaded = self.store.lock().unwrap().load_transactions();
        *self.transactions.lock().unwrap() = loaded;
    }

    /// Clone the current ledger contents.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Records not yet acknowledged by the remote store.
    pub fn unsynced(&self) -> Vec<Transaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.synced)
            .cloned()
            .collect()
    }

    /// The single mutation entry point: swap in a new full snapshot and
    /// persist it. Persistence is best-effort; the in-memory value stays
    /// authoritative for the session either way.
    pub fn replace(&self, next: Vec<Transaction>) {
        let mut transactions = self.transactions.lock().unwrap();
        self.store.lock().unwrap().save_transactions(&next);
        *transactions = next;
    }

    /// Append records to the ledger.
    pub fn add(&self, items: Vec<Transaction>) {
        let mut next = self.snapshot();
        next.extend(items);
        self.replace(next);
    }

    /// Replace the record with the same id. Returns false when no record
    /// matches.
    pub fn apply_edit(&self, updated: Transaction) -> bool {
        let snapshot = self.snapshot();
        if !snapshot.iter().any(|t| t.id == updated.id) {
            return false;
        }
        let next = snapshot
            .into_iter()
            .map(|t| if t.id == updated.id { updated.clone() } else { t })
            .collect();
        self.replace(next);
        true
    }

    /// Remove a record by id, returning it when present.
    pub fn remove(&self, id: &str) -> Option<Transaction> {
        let snapshot = self.snapshot();
        let removed = snapshot.iter().find(|t| t.id == id).cloned()?;
        let next = snapshot.into_iter().filter(|t| t.id != id).collect();
        self.replace(next);
        Some(removed)
    }

    /// Flip a record's sync flag after a successful push. Returns false
    /// when the record has disappeared in the meantime (e.g. deleted while
    /// the push was in flight).
    pub fn mark_synced(&self, id: &str) -> bool {
        let mut hit = false;
        let next: Vec<Transaction> = self
            .snapshot()
            .into_iter()
            .map(|mut t| {
                if t.id == id {
                    t.synced = true;
                    hit = true;
                }
                t
            })
            .collect();
        if hit {
            self.replace(next);
        }
        hit
    }

    /// Aggregate totals over the current snapshot.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats::compute(&self.snapshot())
    }
}
