//! The sync engine facade.
//!
//! Wires the store, the in-memory ledger, the remote client, the outbound
//! queue and the scheduler together, and exposes the user-facing
//! operations. Every user mutation is an optimistic local write (flagged
//! unsynced, persisted immediately) followed by an enqueued push; the
//! remote catches up on the next trigger. No operation here blocks on the
//! network, and no failure in this subsystem surfaces as a blocking error;
//! the worst user-visible symptom is a record staying flagged unsynced
//! until the next successful pass.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{FinError, FinResult};
use crate::extract::{ExtractionOutcome, TransactionProposal};
use crate::ledger::Ledger;
use crate::models::{today_iso, ChatMessage, LedgerStats, Transaction};
use crate::outbound::OutboundQueue;
use crate::remote::{HttpRemote, RemoteLedger, SyncAction};
use crate::scheduler::{Scheduler, SyncState, SyncTask, DEFAULT_POLL_INTERVAL};
use crate::store::Store;
use crate::validation;

/// Offline-first sync engine for the transaction ledger.
pub struct SyncEngine {
    store: Arc<Mutex<Store>>,
    ledger: Arc<Ledger>,
    remote: Arc<dyn RemoteLedger>,
    queue: Arc<OutboundQueue>,
    scheduler: Scheduler,
    settings: Mutex<Settings>,
    chat: Mutex<Vec<ChatMessage>>,
}

impl SyncEngine {
    /// Open the engine over the store at `path` with the HTTP remote
    /// client. Must be called within a tokio runtime.
    pub fn open(path: impl AsRef<Path>) -> FinResult<Self> {
        let store = Store::open(path)?;
        let remote = Arc::new(HttpRemote::new()?);
        Ok(Self::with_remote(store, remote, DEFAULT_POLL_INTERVAL))
    }

    /// Build the engine over an arbitrary remote implementation. Tests use
    /// this with an in-memory double.
    pub fn with_remote(
        store: Store,
        remote: Arc<dyn RemoteLedger>,
        poll_interval: Duration,
    ) -> Self {
        let store = Arc::new(Mutex::new(store));
        let ledger = Arc::new(Ledger::new(store.clone()));
        let queue = Arc::new(OutboundQueue::new());
        let scheduler = Scheduler::new(ledger.clone(), remote.clone(), queue.clone(), poll_interval);

        Self {
            store,
            ledger,
            remote,
            queue,
            scheduler,
            settings: Mutex::new(Settings::default()),
            chat: Mutex::new(Vec::new()),
        }
    }

    /// Load persisted state and arm the sync triggers.
    ///
    /// The local ledger is available synchronously when this returns; the
    /// initial remote reconcile runs in the background so callers never
    /// wait on the network.
    pub fn start(&self) {
        let (settings, chat) = {
            let store = self.store.lock().unwrap();
            (store.load_settings(), store.load_chat_history())
        };
        self.ledger.load();
        *self.chat.lock().unwrap() = chat;

        let endpoint = settings.endpoint();
        *self.settings.lock().unwrap() = settings;
        self.scheduler.set_endpoint(endpoint);
    }

    /// Add records to the ledger, flagged unsynced, and trigger a push.
    /// Returns the number of records added.
    pub fn add_transactions(&self, items: Vec<Transaction>) -> FinResult<usize> {
        for item in &items {
            validation::validate_transaction(item)?;
        }

        let marked: Vec<Transaction> = items
            .into_iter()
            .map(|mut t| {
                t.synced = false;
                t
            })
            .collect();
        for t in &marked {
            self.queue.note_add(&t.id);
        }

        let count = marked.len();
        self.ledger.add(marked);
        self.scheduler.enqueue(SyncTask::Flush);
        Ok(count)
    }

    /// Replace an existing record, re-marking it unsynced until its own
    /// round-trip completes.
    pub fn edit_transaction(&self, mut updated: Transaction) -> FinResult<()> {
        validation::validate_transaction(&updated)?;

        updated.synced = false;
        let id = updated.id.clone();
        if !self.ledger.apply_edit(updated) {
            return Err(FinError::NotFound(format!("transaction {}", id)));
        }
        self.queue.note_update(&id);
        self.scheduler.enqueue(SyncTask::Flush);
        Ok(())
    }

    /// Remove a record. Local removal is immediate; the remote removal is a
    /// fire-and-forget best-effort call with no retry bookkeeping.
    pub fn delete_transaction(&self, id: &str) -> bool {
        let Some(removed) = self.ledger.remove(id) else {
            return false;
        };
        self.queue.clear(id);

        if let Some(endpoint) = self.endpoint() {
            if self.scheduler.is_online() {
                let remote = self.remote.clone();
                tokio::spawn(async move {
                    if !remote.upsert(&endpoint, &removed, SyncAction::Delete).await {
                        debug!(
                            "remote delete failed for {}; copy may resurface until removed remotely",
                            removed.id
                        );
                    }
                });
            }
        }
        true
    }

    /// Confirm a pending record with the payload the oracle extracted for
    /// it. The confirmed record follows the normal edit/sync path.
    pub fn confirm_pending(&self, id: &str, proposal: &TransactionProposal) -> FinResult<Transaction> {
        let pending = self
            .ledger
            .get(id)
            .ok_or_else(|| FinError::NotFound(format!("transaction {}", id)))?;
        let confirmed = proposal.apply_to(pending);
        self.edit_transaction(confirmed.clone())?;
        Ok(confirmed)
    }

    /// Ingest an extraction outcome: each valid proposal becomes a new
    /// unsynced record. Invalid proposals are dropped with a warning: the
    /// oracle is an untrusted producer, and one bad candidate must not
    /// reject the rest. Returns the records actually added.
    pub fn ingest_extraction(&self, outcome: ExtractionOutcome) -> FinResult<Vec<Transaction>> {
        let today = today_iso();
        let mut accepted = Vec::new();
        for proposal in outcome.transactions {
            let tx = proposal.into_transaction(&today);
            match validation::validate_transaction(&tx) {
                Ok(()) => accepted.push(tx),
                Err(e) => warn!("dropping invalid extraction proposal: {}", e),
            }
        }
        if !accepted.is_empty() {
            self.add_transactions(accepted.clone())?;
        }
        Ok(accepted)
    }

    /// Current ledger snapshot.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.ledger.snapshot()
    }

    /// Aggregate totals, with the opening balances from settings applied.
    pub fn stats(&self) -> LedgerStats {
        let mut stats = self.ledger.stats();
        let settings = self.settings.lock().unwrap();
        stats.balance += settings.initial_balance + settings.initial_bank_balance;
        stats
    }

    /// Append a message to the persisted chat log.
    pub fn append_chat_message(&self, message: ChatMessage) {
        let mut chat = self.chat.lock().unwrap();
        chat.push(message);
        self.store.lock().unwrap().save_chat_history(&chat);
    }

    /// The persisted chat log.
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.lock().unwrap().clone()
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    /// Persist new settings. When the remote endpoint changed, the sync
    /// triggers are torn down and re-armed for the new target.
    pub fn update_settings(&self, next: Settings) {
        let endpoint_changed = {
            let mut current = self.settings.lock().unwrap();
            let changed = current.script_url != next.script_url;
            *current = next.clone();
            changed
        };
        self.store.lock().unwrap().save_settings(&next);
        if endpoint_changed {
            self.scheduler.set_endpoint(next.endpoint());
        }
    }

    /// Report a connectivity change. An offline-to-online transition
    /// triggers a flush of everything unsynced.
    pub fn set_online(&self, online: bool) {
        self.scheduler.set_online(online);
    }

    /// Manually request a reconcile and flush (e.g. pull-to-refresh).
    pub fn sync_now(&self) {
        self.scheduler.enqueue(SyncTask::Reconcile);
        self.scheduler.enqueue(SyncTask::Flush);
    }

    /// Observe scheduler activity (Idle/Syncing), e.g. for a spinner.
    pub fn sync_state(&self) -> tokio::sync::watch::Receiver<SyncState> {
        self.scheduler.state()
    }

    /// Tear down the scheduler worker and triggers.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn endpoint(&self) -> Option<String> {
        self.settings.lock().unwrap().endpoint()
    }
}
