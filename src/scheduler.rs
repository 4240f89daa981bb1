//! Sync scheduler.
//!
//! Drives when reconciliation and outbound flushes happen: once when a
//! remote endpoint is armed (app load), on every offline-to-online
//! transition (plus immediately when already online at arm time), and on a
//! fixed polling interval.
//!
//! Every trigger enqueues a [`SyncTask`] on a channel drained by a single
//! worker, so tasks run strictly one at a time. Interleaving between
//! trigger sources is thereby reduced to a deterministic last-write-wins
//! over whole-ledger replacements; no cross-task ordering beyond that is
//! guaranteed, by design.
//!
//! The polling timer and the connectivity listener are scoped to the active
//! endpoint configuration: changing or clearing the endpoint tears them
//! down and re-arms them for the new target. A task already picked up by
//! the worker is never aborted mid-flight; its result lands on whatever
//! ledger is current by then.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::ledger::Ledger;
use crate::models::Transaction;
use crate::outbound::OutboundQueue;
use crate::reconcile;
use crate::remote::RemoteLedger;

/// How often the remote snapshot is polled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Scheduler activity, observable by the UI (e.g. a spinner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// A unit of sync work. Triggers enqueue these; the worker runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTask {
    /// Fetch the remote snapshot and merge it into the local ledger.
    Reconcile,
    /// Push all currently-unsynced records.
    Flush,
}

struct SchedulerInner {
    tasks: mpsc::UnboundedSender<SyncTask>,
    endpoint: watch::Sender<Option<String>>,
    online: watch::Sender<bool>,
    state_rx: watch::Receiver<SyncState>,
    poll_interval: Duration,
    triggers: Mutex<Vec<JoinHandle<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Serialized task queue driving reconciliation and flushes.
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Spawn the worker. Must be called within a tokio runtime. The
    /// scheduler starts with no endpoint armed and connectivity assumed
    /// online until [`Scheduler::set_online`] says otherwise.
    pub fn new(
        ledger: Arc<Ledger>,
        remote: Arc<dyn RemoteLedger>,
        queue: Arc<OutboundQueue>,
        poll_interval: Duration,
    ) -> Self {
        let (tasks_tx, tasks_rx) = mpsc::unbounded_channel();
        let (endpoint_tx, endpoint_rx) = watch::channel(None);
        let (online_tx, _) = watch::channel(true);
        let (state_tx, state_rx) = watch::channel(SyncState::Idle);

        let online_rx = online_tx.subscribe();
        let worker = tokio::spawn(worker_loop(
            tasks_rx,
            ledger,
            remote,
            queue,
            endpoint_rx,
            online_rx,
            state_tx,
        ));

        Self {
            inner: Arc::new(SchedulerInner {
                tasks: tasks_tx,
                endpoint: endpoint_tx,
                online: online_tx,
                state_rx,
                poll_interval,
                triggers: Mutex::new(Vec::new()),
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// Point the scheduler at a remote endpoint, or clear it with `None`.
    ///
    /// Tears down the polling timer and connectivity listener of the
    /// previous configuration and, for a new endpoint, re-arms both and
    /// enqueues an initial reconcile.
    pub fn set_endpoint(&self, endpoint: Option<String>) {
        {
            let mut triggers = self.inner.triggers.lock().unwrap();
            for handle in triggers.drain(..) {
                handle.abort();
            }
        }

        let armed = endpoint.is_some();
        self.inner.endpoint.send_replace(endpoint);
        if !armed {
            debug!("remote endpoint cleared; sync triggers disarmed");
            return;
        }

        // Polling trigger. The initial reconcile is enqueued below, so the
        // first (immediate) interval tick is consumed up front.
        let tasks = self.inner.tasks.clone();
        let interval = self.inner.poll_interval;
        let poll = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tasks.send(SyncTask::Reconcile).is_err() {
                    break;
                }
            }
        });

        // Connectivity trigger: flush on every offline-to-online
        // transition, and immediately when already online at arm time.
        let tasks = self.inner.tasks.clone();
        let mut online_rx = self.inner.online.subscribe();
        let connectivity = tokio::spawn(async move {
            let mut was_online = *online_rx.borrow();
            if was_online {
                let _ = tasks.send(SyncTask::Flush);
            }
            while online_rx.changed().await.is_ok() {
                let now_online = *online_rx.borrow();
                if now_online && !was_online && tasks.send(SyncTask::Flush).is_err() {
                    break;
                }
                was_online = now_online;
            }
        });

        {
            let mut triggers = self.inner.triggers.lock().unwrap();
            triggers.push(poll);
            triggers.push(connectivity);
        }

        info!("remote endpoint armed; scheduling initial reconcile");
        let _ = self.inner.tasks.send(SyncTask::Reconcile);
    }

    /// Report a connectivity change.
    pub fn set_online(&self, online: bool) {
        self.inner.online.send_replace(online);
    }

    /// Current connectivity assumption.
    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Enqueue a task, e.g. the flush following a user mutation.
    pub fn enqueue(&self, task: SyncTask) {
        let _ = self.inner.tasks.send(task);
    }

    /// Observe scheduler activity.
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.inner.state_rx.clone()
    }

    /// Tear down the worker and all triggers.
    pub fn shutdown(&self) {
        let mut triggers = self.inner.triggers.lock().unwrap();
        for handle in triggers.drain(..) {
            handle.abort();
        }
        if let Some(worker) = self.inner.worker.lock().unwrap().take() {
            worker.abort();
        }
    }
}

async fn worker_loop(
    mut tasks: mpsc::UnboundedReceiver<SyncTask>,
    ledger: Arc<Ledger>,
    remote: Arc<dyn RemoteLedger>,
    queue: Arc<OutboundQueue>,
    endpoint_rx: watch::Receiver<Option<String>>,
    online_rx: watch::Receiver<bool>,
    state: watch::Sender<SyncState>,
) {
    while let Some(task) = tasks.recv().await {
        let endpoint = endpoint_rx.borrow().clone();
        let Some(endpoint) = endpoint else {
            debug!("no remote endpoint configured; dropping {:?}", task);
            continue;
        };

        let _ = state.send_replace(SyncState::Syncing);
        match task {
            SyncTask::Reconcile => reconcile_once(&ledger, remote.as_ref(), &endpoint).await,
            SyncTask::Flush => {
                if *online_rx.borrow() {
                    queue.flush(&ledger, remote.as_ref(), &endpoint).await;
                } else {
                    debug!("offline; deferring flush to the next connectivity trigger");
                }
            }
        }
        let _ = state.send_replace(SyncState::Idle);
    }
}

/// Fetch the remote snapshot and merge it into the ledger. The merged
/// result only replaces the ledger when its serialized form differs from
/// the current one (cheap whole-snapshot diff, not field-level).
async fn reconcile_once(ledger: &Ledger, remote: &dyn RemoteLedger, endpoint: &str) {
    match remote.fetch_all(endpoint).await {
        Some(snapshot) => {
            let local = ledger.snapshot();
            let merged = reconcile::merge(snapshot, &local);
            if same_serialized(&merged, &local) {
                debug!("remote snapshot matches local ledger");
            } else {
                info!("applying reconciled ledger ({} records)", merged.len());
                ledger.replace(merged);
            }
        }
        None => debug!("remote fetch failed; keeping local ledger"),
    }
}

fn same_serialized(a: &[Transaction], b: &[Transaction]) -> bool {
    match (serde_json::to_string(a), serde_json::to_string(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::models::TransactionType;
    use crate::remote::testing::MemoryRemote;
    use crate::store::Store;

    const EP: &str = "https://example.test/exec";

    fn tx(id: &str, synced: bool) -> Transaction {
        let mut t = Transaction::new(10.0, "Khác", id, "2025-01-01", TransactionType::Expense);
        t.id = id.to_string();
        t.synced = synced;
        t
    }

    fn fixture(poll: Duration) -> (Arc<Ledger>, Arc<MemoryRemote>, Scheduler) {
        let store = Arc::new(StdMutex::new(Store::open_in_memory().unwrap()));
        let ledger = Arc::new(Ledger::new(store));
        let remote = Arc::new(MemoryRemote::new());
        let scheduler = Scheduler::new(
            ledger.clone(),
            remote.clone(),
            Arc::new(OutboundQueue::new()),
            poll,
        );
        (ledger, remote, scheduler)
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 5s");
    }

    #[tokio::test]
    async fn test_arming_endpoint_reconciles() {
        let (ledger, remote, scheduler) = fixture(Duration::from_secs(3600));
        scheduler.set_online(false); // isolate the reconcile from the arm-time flush
        ledger.replace(vec![tx("local", false)]);
        remote.seed(vec![tx("remote", false)]);

        scheduler.set_endpoint(Some(EP.to_string()));

        wait_until(|| ledger.snapshot().len() == 2).await;
        let snapshot = ledger.snapshot();
        assert!(snapshot.iter().any(|t| t.id == "remote" && t.synced));
        assert!(snapshot.iter().any(|t| t.id == "local" && !t.synced));
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_tasks_dropped_without_endpoint() {
        let (_ledger, remote, scheduler) = fixture(Duration::from_secs(3600));

        scheduler.enqueue(SyncTask::Reconcile);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.fetch_count(), 0);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_online_at_arm_time_flushes_immediately() {
        let (ledger, remote, scheduler) = fixture(Duration::from_secs(3600));
        ledger.replace(vec![tx("t1", false)]);

        scheduler.set_endpoint(Some(EP.to_string()));

        wait_until(|| ledger.unsynced().is_empty()).await;
        assert_eq!(remote.records().len(), 1);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_offline_to_online_transition_triggers_flush() {
        let (ledger, remote, scheduler) = fixture(Duration::from_secs(3600));
        scheduler.set_online(false);
        ledger.replace(vec![tx("a", false), tx("b", false)]);

        scheduler.set_endpoint(Some(EP.to_string()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Offline: flush deferred, nothing pushed.
        assert!(remote.upsert_calls().is_empty());

        scheduler.set_online(true);
        wait_until(|| ledger.unsynced().is_empty()).await;
        assert_eq!(remote.records().len(), 2);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_polling_fetches_repeatedly() {
        let (_ledger, remote, scheduler) = fixture(Duration::from_millis(20));

        scheduler.set_endpoint(Some(EP.to_string()));

        wait_until(|| remote.fetch_count() >= 3).await;
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_clearing_endpoint_disarms_triggers() {
        let (_ledger, remote, scheduler) = fixture(Duration::from_millis(20));
        scheduler.set_endpoint(Some(EP.to_string()));
        wait_until(|| remote.fetch_count() >= 1).await;

        scheduler.set_endpoint(None);
        tokio::time::sleep(Duration::from_millis(60)).await;
        let settled = remote.fetch_count();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.fetch_count(), settled);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_poll_applies_remote_changes() {
        let (ledger, remote, scheduler) = fixture(Duration::from_millis(20));
        scheduler.set_endpoint(Some(EP.to_string()));
        wait_until(|| remote.fetch_count() >= 1).await;

        // A record appears remotely between polls.
        remote.seed(vec![tx("new-remote", false)]);
        wait_until(|| ledger.snapshot().iter().any(|t| t.id == "new-remote")).await;
        assert!(ledger.get("new-remote").unwrap().synced);
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_local_ledger() {
        let (ledger, remote, scheduler) = fixture(Duration::from_secs(3600));
        ledger.replace(vec![tx("keep", true)]);
        remote.set_fetch_unavailable(true);

        scheduler.set_endpoint(Some(EP.to_string()));
        wait_until(|| remote.fetch_count() >= 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(ledger.snapshot().len(), 1);
        assert_eq!(ledger.snapshot()[0].id, "keep");
        scheduler.shutdown();
    }
}
