//! Interface boundary for the extraction oracle.
//!
//! The oracle turns free-form input (text, and optionally audio or image
//! data) into structured transaction proposals plus an optional free-text
//! answer. Its implementation lives outside this crate; fincore only
//! defines the request/response contract and treats the oracle as an
//! untrusted producer of candidate payloads. Accepted proposals flow
//! through the same local-write + sync path as manually entered records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FinResult;
use crate::models::{
    new_id, PaymentMethod, Transaction, TransactionStatus, TransactionType,
};

/// Free-form input handed to the oracle. Transaction history is passed as
/// context so the oracle can answer analysis questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionInput<'a> {
    pub text: Option<&'a str>,
    pub image_base64: Option<&'a str>,
    pub audio_base64: Option<&'a str>,
    pub mime_type: Option<&'a str>,
    pub history: &'a [Transaction],
}

/// One candidate transaction proposed by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionProposal {
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// ISO date; absent means "use the caller's fallback date"
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl TransactionProposal {
    /// Materialize a new ledger record from this proposal. The record gets
    /// a fresh id and starts unsynced, like any other local creation.
    pub fn into_transaction(self, fallback_date: &str) -> Transaction {
        Transaction {
            id: new_id(),
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date.unwrap_or_else(|| fallback_date.to_string()),
            kind: self.kind,
            status: TransactionStatus::Confirmed,
            person: self.person,
            location: self.location,
            payment_method: self.payment_method.unwrap_or_default(),
            synced: false,
        }
    }

    /// Overwrite a pending record's payload with this proposal, keeping the
    /// record's identity and confirming it. Context fields fall back to
    /// what the pending record already had.
    pub fn apply_to(&self, pending: Transaction) -> Transaction {
        Transaction {
            id: pending.id,
            amount: self.amount,
            category: self.category.clone(),
            description: self.description.clone(),
            date: self.date.clone().unwrap_or(pending.date),
            kind: self.kind,
            status: TransactionStatus::Confirmed,
            person: self.person.clone().or(pending.person),
            location: self.location.clone().or(pending.location),
            payment_method: self.payment_method.unwrap_or(pending.payment_method),
            synced: pending.synced,
        }
    }
}

/// What the oracle produced for one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    /// Zero or more candidate transactions
    #[serde(default)]
    pub transactions: Vec<TransactionProposal>,
    /// Optional free-text answer (analysis questions, clarifications)
    #[serde(default)]
    pub answer: Option<String>,
}

/// The external classification oracle, consumed through a request/response
/// contract.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn extract(&self, input: ExtractionInput<'_>) -> FinResult<ExtractionOutcome>;
}
