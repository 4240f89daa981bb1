//! Data models for fincore.
//!
//! This module defines the core entities: Transaction (the unit of
//! synchronization), ChatMessage (the persisted message log), and the
//! statistics snapshot derived from the ledger. IDs are UUID7 hex strings
//! assigned client-side at creation and stable for the record's lifetime.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Expense categories offered by the app. The category field itself is an
/// open string; these are the canonical values the extraction oracle and the
/// UI work with.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Ăn uống",
    "Di chuyển",
    "Mua sắm",
    "Hóa đơn",
    "Giải trí",
    "Sức khỏe",
    "Giáo dục",
    "Khác",
];

/// Income categories.
pub const INCOME_CATEGORIES: &[&str] = &["Lương", "Đầu tư", "Khác"];

/// Generate a new record ID (UUID7 as a 32-char hex string).
pub fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Today's date as an ISO date string (YYYY-MM-DD).
pub fn today_iso() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Whether a transaction moves money in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

/// Confirmation state of a transaction. Pending records are awaiting
/// approval and do not participate in financial totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Confirmed,
}

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Transfer,
    Card,
}

/// A single ledger entry and the unit of synchronization.
///
/// The `synced` flag is local-only bookkeeping: `false` means the record was
/// created or modified locally and not yet acknowledged by the remote store,
/// `true` means the remote is known to hold an identical copy. It is
/// persisted in the local blob but never transmitted to the remote (the wire
/// type in [`crate::remote`] does not carry it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// ISO date string (YYYY-MM-DD)
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Local-only sync flag, see type docs.
    #[serde(default)]
    pub synced: bool,
}

impl Transaction {
    /// Create a new transaction with a fresh ID, flagged unsynced.
    pub fn new(
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
        date: impl Into<String>,
        kind: TransactionType,
    ) -> Self {
        Self {
            id: new_id(),
            amount,
            category: category.into(),
            description: description.into(),
            date: date.into(),
            kind,
            status: TransactionStatus::Confirmed,
            person: None,
            location: None,
            payment_method: PaymentMethod::Cash,
            synced: false,
        }
    }

    /// Check whether the record participates in financial totals.
    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One entry of the persisted message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<String>,
}

impl ChatMessage {
    /// Create a new chat message stamped with the current time.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            related_transaction_id: None,
        }
    }
}

/// Aggregate totals over the ledger. Only confirmed records are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

impl LedgerStats {
    /// Compute totals over a ledger snapshot. Pending records are excluded;
    /// balance is income minus expense (opening balances are the caller's
    /// concern).
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut stats = LedgerStats::default();
        for t in transactions.iter().filter(|t| t.is_confirmed()) {
            match t.kind {
                TransactionType::Income => stats.total_income += t.amount,
                TransactionType::Expense => stats.total_expense += t.amount,
            }
        }
        stats.balance = stats.total_income - stats.total_expense;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_creation() {
        let tx = Transaction::new(
            50_000.0,
            "Ăn uống",
            "bún chả",
            "2025-03-01",
            TransactionType::Expense,
        );

        assert!(!tx.id.is_empty());
        assert_eq!(tx.amount, 50_000.0);
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.payment_method, PaymentMethod::Cash);
        assert!(!tx.synced);
    }

    #[test]
    fn test_id_hex_format() {
        let tx = Transaction::new(1.0, "Khác", "x", "2025-01-01", TransactionType::Expense);
        assert_eq!(tx.id.len(), 32); // UUID without hyphens
        assert!(tx.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Expense).unwrap(),
            "\"EXPENSE\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"TRANSFER\""
        );
    }

    #[test]
    fn test_transaction_serde_round_trip_keeps_sync_flag() {
        let mut tx = Transaction::new(10.0, "Khác", "x", "2025-01-01", TransactionType::Income);
        tx.synced = true;

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        assert!(back.synced);
    }

    #[test]
    fn test_stats_exclude_pending() {
        let mut pending = Transaction::new(
            999.0,
            "Khác",
            "pending",
            "2025-01-01",
            TransactionType::Expense,
        );
        pending.status = TransactionStatus::Pending;

        let txs = vec![
            Transaction::new(300.0, "Lương", "salary", "2025-01-01", TransactionType::Income),
            Transaction::new(100.0, "Ăn uống", "lunch", "2025-01-02", TransactionType::Expense),
            pending,
        ];

        let stats = LedgerStats::compute(&txs);
        assert_eq!(stats.total_income, 300.0);
        assert_eq!(stats.total_expense, 100.0);
        assert_eq!(stats.balance, 200.0);
    }

    #[test]
    fn test_category_tables() {
        assert!(EXPENSE_CATEGORIES.contains(&"Ăn uống"));
        assert!(INCOME_CATEGORIES.contains(&"Lương"));
        // "Khác" is the catch-all on both sides.
        assert!(EXPENSE_CATEGORIES.contains(&"Khác"));
        assert!(INCOME_CATEGORIES.contains(&"Khác"));
    }

    #[test]
    fn test_today_iso_format() {
        let today = today_iso();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
        assert_eq!(&today[7..8], "-");
    }
}
