//! FinCore - Rust implementation of the FinBot personal finance tracker core.
//!
//! This library provides the offline-first synchronization engine for
//! FinBot:
//! - Data models (Transaction, ChatMessage, Settings)
//! - Local persistence (SQLite-backed blob store)
//! - Remote ledger client (spreadsheet-backed endpoint)
//! - Reconciliation (merge-by-id with unsynced-local preservation)
//! - Sync scheduling (serialized task queue, connectivity and poll triggers)
//! - Outbound queue (sequential push with unbounded retry)
//!
//! The design is offline-first: the local ledger is the source of truth for
//! the session, user mutations are optimistic writes flagged unsynced, and
//! the remote store converges eventually once connectivity allows. There is
//! deliberately no strong consistency and no conflict resolution beyond
//! duplicate suppression; the consistency model is last-write-wins over
//! whole-ledger replacements.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod outbound;
pub mod reconcile;
pub mod remote;
pub mod scheduler;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::Settings;
pub use engine::SyncEngine;
pub use error::{FinError, FinResult, ValidationError};
pub use extract::{ExtractionInput, ExtractionOracle, ExtractionOutcome, TransactionProposal};
pub use ledger::Ledger;
pub use models::{
    ChatMessage, ChatRole, LedgerStats, PaymentMethod, Transaction, TransactionStatus,
    TransactionType,
};
pub use outbound::{FlushReport, OutboundQueue};
pub use remote::{HttpRemote, RemoteLedger, RemoteTransaction, SyncAction};
pub use scheduler::{Scheduler, SyncState, SyncTask, DEFAULT_POLL_INTERVAL};
pub use store::Store;
