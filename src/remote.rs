//! Remote ledger client.
//!
//! Stateless request/response wrapper around the remote spreadsheet-backed
//! endpoint. The remote store is an external collaborator with no structured
//! error channel, so every transport failure, non-success status and decode
//! failure is folded into a binary signal: `None` for reads, `false` for
//! writes. No retries happen at this layer; idempotent retry is the outbound
//! queue's responsibility, and the endpoint is relied upon (by contract) to
//! perform an upsert-by-id so that resubmission is harmless.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{FinError, FinResult};
use crate::models::{PaymentMethod, Transaction, TransactionStatus, TransactionType};

/// Intent attached to an outbound record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAction {
    Add,
    Update,
    Delete,
}

/// Wire representation of a transaction.
///
/// Decoding defensively defaults every field so the reconciliation engine
/// never sees a malformed record: a missing `status` becomes confirmed and a
/// missing `paymentMethod` becomes cash. The local-only sync flag is not
/// part of this type and therefore never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTransaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl From<&Transaction> for RemoteTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            date: tx.date.clone(),
            description: tx.description.clone(),
            amount: tx.amount,
            category: tx.category.clone(),
            kind: tx.kind,
            status: tx.status,
            person: tx.person.clone(),
            location: tx.location.clone(),
            payment_method: tx.payment_method,
        }
    }
}

impl RemoteTransaction {
    /// Convert into a local record. Anything fetched from the remote store
    /// is by definition held remotely, so it ingests as synced.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id,
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date,
            kind: self.kind,
            status: self.status,
            person: self.person,
            location: self.location,
            payment_method: self.payment_method,
            synced: true,
        }
    }
}

/// Read response envelope: `{"status": "success", "data": [...]}`.
#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<Vec<RemoteTransaction>>,
}

/// Write request envelope: `{"action": "ADD", "data": {...}}`.
#[derive(Debug, Serialize)]
struct WriteRequest {
    action: SyncAction,
    data: RemoteTransaction,
}

/// Client-side view of the remote ledger endpoint.
///
/// The production implementation is [`HttpRemote`]; tests drive the sync
/// engine against an in-memory double with scripted outcomes.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Fetch the full remote snapshot. Returns `None` on any transport
    /// failure, non-success status or malformed payload. Returned records
    /// are already marked synced.
    async fn fetch_all(&self, endpoint: &str) -> Option<Vec<Transaction>>;

    /// Send one record with its intent. Returns whether the call completed
    /// and the endpoint reported an acceptable status.
    async fn upsert(&self, endpoint: &str, tx: &Transaction, action: SyncAction) -> bool;
}

/// HTTP implementation of [`RemoteLedger`] for Apps Script web endpoints.
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    /// Create a new client with the default 30 second timeout.
    pub fn new() -> FinResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FinError::network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteLedger for HttpRemote {
    async fn fetch_all(&self, endpoint: &str) -> Option<Vec<Transaction>> {
        let response = match self.client.get(endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("remote fetch failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("remote fetch returned HTTP {}", response.status());
            return None;
        }

        let body: FetchResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("remote fetch payload malformed: {}", e);
                return None;
            }
        };

        if body.status != "success" {
            tracing::debug!("remote fetch reported status '{}'", body.status);
            return None;
        }

        let data = body.data?;
        // Records without an id cannot participate in sync; drop them here
        // so downstream code can rely on non-empty ids.
        Some(
            data.into_iter()
                .filter(|t| !t.id.is_empty())
                .map(RemoteTransaction::into_transaction)
                .collect(),
        )
    }

    async fn upsert(&self, endpoint: &str, tx: &Transaction, action: SyncAction) -> bool {
        let request = WriteRequest {
            action,
            data: RemoteTransaction::from(tx),
        };
        let body = match serde_json::to_string(&request) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("failed to encode outbound record {}: {}", tx.id, e);
                return false;
            }
        };

        // text/plain keeps the Apps Script endpoint from triggering a CORS
        // preflight; success is judged by HTTP status alone.
        match self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("remote write failed for {}: {}", tx.id, e);
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_action_wire_format() {
        assert_eq!(serde_json::to_string(&SyncAction::Add).unwrap(), "\"ADD\"");
        assert_eq!(serde_json::to_string(&SyncAction::Update).unwrap(), "\"UPDATE\"");
        assert_eq!(serde_json::to_string(&SyncAction::Delete).unwrap(), "\"DELETE\"");
    }

    #[test]
    fn test_defensive_decoding_defaults() {
        // Only the fields the sheet always has; status and paymentMethod
        // are missing and must default.
        let raw = r#"{
            "id": "t1",
            "date": "2025-03-01",
            "description": "lunch",
            "amount": 50000,
            "category": "Ăn uống",
            "type": "EXPENSE"
        }"#;
        let remote: RemoteTransaction = serde_json::from_str(raw).unwrap();
        assert_eq!(remote.status, TransactionStatus::Confirmed);
        assert_eq!(remote.payment_method, PaymentMethod::Cash);
        assert!(remote.person.is_none());
        assert!(remote.location.is_none());
    }

    #[test]
    fn test_ingested_record_is_synced() {
        let remote: RemoteTransaction =
            serde_json::from_str(r#"{"id":"t1","type":"INCOME","amount":1}"#).unwrap();
        let tx = remote.into_transaction();
        assert!(tx.synced);
        assert_eq!(tx.kind, TransactionType::Income);
    }

    #[test]
    fn test_wire_type_never_carries_sync_flag() {
        let mut tx = Transaction::new(1.0, "Khác", "x", "2025-01-01", TransactionType::Expense);
        tx.synced = true;
        let json = serde_json::to_string(&RemoteTransaction::from(&tx)).unwrap();
        assert!(!json.contains("synced"));
    }

    #[test]
    fn test_write_request_envelope() {
        let tx = Transaction::new(1.0, "Khác", "x", "2025-01-01", TransactionType::Expense);
        let request = WriteRequest {
            action: SyncAction::Add,
            data: RemoteTransaction::from(&tx),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.starts_with(r#"{"action":"ADD","data":{"#));
    }

    #[tokio::test]
    async fn test_memory_remote_upsert_is_idempotent() {
        let remote = testing::MemoryRemote::new();
        let tx = Transaction::new(1.0, "Khác", "x", "2025-01-01", TransactionType::Expense);

        assert!(remote.upsert("ep", &tx, SyncAction::Add).await);
        assert!(remote.upsert("ep", &tx, SyncAction::Add).await);
        assert_eq!(remote.records().len(), 1);
    }
}
