//! Reconciliation of a remote snapshot with the local ledger.
//!
//! This is deliberately not a general CRDT merge. It is a one-directional
//! precedence rule: the remote copy wins on any id collision, and the only
//! local records that survive are unsynced ones whose id the remote has
//! never seen. That trades away a local edit racing a remote fetch in
//! exchange for never losing a record that has not reached the remote at
//! all.

use std::collections::HashSet;

use crate::models::Transaction;

/// Merge a remote snapshot with the current local ledger.
///
/// Every record from `remote` enters the result marked synced. Local
/// records are carried over only when they are unsynced and their id is
/// absent from the remote snapshot; everything else local is discarded in
/// favor of the remote copy. The result is deterministic for fixed inputs
/// and contains no duplicate ids provided `remote` itself has none.
pub fn merge(remote: Vec<Transaction>, local: &[Transaction]) -> Vec<Transaction> {
    let remote_ids: HashSet<&str> = remote.iter().map(|t| t.id.as_str()).collect();

    let mut merged: Vec<Transaction> = remote
        .iter()
        .cloned()
        .map(|mut t| {
            t.synced = true;
            t
        })
        .collect();

    merged.extend(
        local
            .iter()
            .filter(|t| !t.synced && !remote_ids.contains(t.id.as_str()))
            .cloned(),
    );

    merged
}
