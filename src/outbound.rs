//! Outbound queue processor.
//!
//! Walks every unsynced record and pushes it to the remote client, one
//! in-flight request at a time. The queue itself is just intent bookkeeping
//! keyed by record id: which action should carry a record when its turn
//! comes. A record whose intent was never noted (e.g. after an app restart,
//! the queue being in-memory) is pushed as ADD and absorbed by the remote's
//! upsert-by-id contract.
//!
//! A failed push leaves the record unsynced and its intent queued; it is
//! retried on the next trigger with no backoff and no retry ceiling.
//! Failure on one record never stops the walk.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::ledger::Ledger;
use crate::remote::{RemoteLedger, SyncAction};

/// Outcome of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Unsynced records found at the start of the pass
    pub attempted: usize,
    /// Records acknowledged by the remote during the pass
    pub pushed: usize,
}

/// Retry-eligible outbound intents keyed by record id.
#[derive(Default)]
pub struct OutboundQueue {
    intents: Mutex<HashMap<String, SyncAction>>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a freshly created record. ADD intent sticks even if the record
    /// is edited before its first push, since the remote has never seen the
    /// id; the pushed payload is always the record's current state.
    pub fn note_add(&self, id: &str) {
        self.intents
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert(SyncAction::Add);
    }

    /// Note a locally edited record. Keeps a pending ADD if one exists.
    pub fn note_update(&self, id: &str) {
        self.intents
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert(SyncAction::Update);
    }

    /// Drop any queued intent, e.g. when the record is deleted locally.
    pub fn clear(&self, id: &str) {
        self.intents.lock().unwrap().remove(id);
    }

    /// The action that should carry a record on its next push.
    pub fn intent(&self, id: &str) -> SyncAction {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(SyncAction::Add)
    }

    /// Push every currently-unsynced record to the remote, sequentially.
    ///
    /// The set of records is snapshotted at entry; records added mid-flush
    /// are picked up by the next trigger. Each success flips the record's
    /// sync flag (persisting the full ledger) and retires the intent.
    pub async fn flush(
        &self,
        ledger: &Ledger,
        remote: &dyn RemoteLedger,
        endpoint: &str,
    ) -> FlushReport {
        let pending = ledger.unsynced();
        if pending.is_empty() {
            return FlushReport::default();
        }

        info!("pushing {} unsynced transaction(s)", pending.len());
        let mut report = FlushReport {
            attempted: pending.len(),
            pushed: 0,
        };

        for tx in pending {
            let action = self.intent(&tx.id);
            if remote.upsert(endpoint, &tx, action).await {
                if ledger.mark_synced(&tx.id) {
                    report.pushed += 1;
                } else {
                    debug!("record {} vanished during push; dropping intent", tx.id);
                }
                self.clear(&tx.id);
            } else {
                warn!("push failed for {}; will retry on next trigger", tx.id);
            }
        }

        report
    }
}
