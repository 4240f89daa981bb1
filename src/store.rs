//! Local persistence for fincore.
//!
//! The store keeps three independent named blobs in a single SQLite
//! key-value table: the transaction ledger, the settings record, and the
//! chat message log. Each blob is read and written wholesale as JSON text;
//! there are no partial writes. Loads never fail (a missing or corrupt blob
//! yields the empty value), and saves are best-effort: a write error is
//! logged and swallowed, because the in-memory state stays authoritative for
//! the running session.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Settings;
use crate::error::FinResult;
use crate::models::{ChatMessage, Transaction};

const TRANSACTIONS_KEY: &str = "transactions";
const SETTINGS_KEY: &str = "settings";
const CHAT_HISTORY_KEY: &str = "chat_history";

/// Durable key-value store backing the ledger, settings and message log.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> FinResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store. Used by tests and ephemeral sessions.
    pub fn open_in_memory() -> FinResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> FinResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    fn read_blob(&self, key: &str) -> FinResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write_blob(&self, key: &str, value: &str) -> FinResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load a blob, tolerating absence and corruption.
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.read_blob(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("failed to read '{}' blob: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("discarding corrupt '{}' blob: {}", key, e);
                None
            }
        }
    }

    /// Persist a blob best-effort. Errors are logged and swallowed.
    fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("failed to serialize '{}' blob: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.write_blob(key, &raw) {
            tracing::warn!("failed to persist '{}' blob: {}", key, e);
        }
    }

    /// Load the transaction ledger. Returns an empty ledger on missing or
    /// corrupt data, never an error.
    pub fn load_transactions(&self) -> Vec<Transaction> {
        self.load_json(TRANSACTIONS_KEY).unwrap_or_default()
    }

    /// Overwrite the persisted ledger with the given snapshot. Idempotent;
    /// called after every mutation of the in-memory ledger.
    pub fn save_transactions(&self, transactions: &[Transaction]) {
        self.save_json(TRANSACTIONS_KEY, &transactions);
    }

    /// Load the settings record, falling back to defaults.
    pub fn load_settings(&self) -> Settings {
        self.load_json(SETTINGS_KEY).unwrap_or_default()
    }

    /// Persist the settings record.
    pub fn save_settings(&self, settings: &Settings) {
        self.save_json(SETTINGS_KEY, settings);
    }

    /// Load the chat message log.
    pub fn load_chat_history(&self) -> Vec<ChatMessage> {
        self.load_json(CHAT_HISTORY_KEY).unwrap_or_default()
    }

    /// Persist the chat message log.
    pub fn save_chat_history(&self, history: &[ChatMessage]) {
        self.save_json(CHAT_HISTORY_KEY, &history);
    }
}
