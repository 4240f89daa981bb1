//! Input validation for fincore.
//!
//! This module provides validation functions for transaction payloads before
//! they enter the ledger. All validators return FinError::Validation on
//! failure. The sync engine requires a non-empty id on every record it
//! touches; an id-less record is a defect, not a valid state.

use crate::error::{FinError, FinResult};
use crate::models::Transaction;

// Limits
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MAX_CONTEXT_FIELD_LENGTH: usize = 200;

/// Expected date format: "YYYY-MM-DD"
/// Must always be zero-padded so that string comparison orders dates
/// correctly. "2025-01-01" is correct, "2025-1-1" is WRONG.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate a record id: non-empty, no surrounding whitespace.
pub fn validate_id(value: &str) -> FinResult<()> {
    if value.is_empty() {
        return Err(FinError::validation("id", "id must not be empty"));
    }
    if value.trim() != value {
        return Err(FinError::validation(
            "id",
            "id must not contain leading or trailing whitespace",
        ));
    }
    Ok(())
}

/// Validate a transaction amount: finite and strictly positive.
pub fn validate_amount(value: f64) -> FinResult<()> {
    if !value.is_finite() {
        return Err(FinError::validation("amount", "amount must be a finite number"));
    }
    if value <= 0.0 {
        return Err(FinError::validation("amount", "amount must be positive"));
    }
    Ok(())
}

/// Validate an ISO date string in the format "YYYY-MM-DD" with zero-padded
/// values.
///
/// Valid: "2025-01-01", "2025-12-31"
/// Invalid: "2025-1-1", "01-01-2025", "2025/01/01"
pub fn validate_date(value: &str) -> FinResult<()> {
    if value.len() != 10 {
        return Err(FinError::validation(
            "date",
            format!(
                "date must be exactly 10 characters in format 'YYYY-MM-DD', got {} characters",
                value.len()
            ),
        ));
    }

    let bytes = value.as_bytes();

    // Digits at: 0,1,2,3 (year), 5,6 (month), 8,9 (day); dashes at 4 and 7
    let digit_positions = [0, 1, 2, 3, 5, 6, 8, 9];
    for pos in digit_positions {
        if !bytes[pos].is_ascii_digit() {
            return Err(FinError::validation(
                "date",
                format!(
                    "date must be in format 'YYYY-MM-DD', invalid character at position {}",
                    pos
                ),
            ));
        }
    }

    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(FinError::validation(
            "date",
            "date must use '-' separators between date parts (YYYY-MM-DD)",
        ));
    }

    // Validate ranges
    let month: u32 = value[5..7].parse().unwrap_or(0);
    let day: u32 = value[8..10].parse().unwrap_or(0);

    if !(1..=12).contains(&month) {
        return Err(FinError::validation("date", "month must be between 01 and 12"));
    }
    if !(1..=31).contains(&day) {
        return Err(FinError::validation("date", "day must be between 01 and 31"));
    }

    Ok(())
}

/// Validate a category string.
pub fn validate_category(value: &str) -> FinResult<()> {
    if value.trim().is_empty() {
        return Err(FinError::validation("category", "category must not be empty"));
    }
    if value.len() > MAX_CATEGORY_LENGTH {
        return Err(FinError::validation(
            "category",
            format!("category must be at most {} bytes", MAX_CATEGORY_LENGTH),
        ));
    }
    Ok(())
}

/// Validate a whole transaction before it enters the ledger.
pub fn validate_transaction(tx: &Transaction) -> FinResult<()> {
    validate_id(&tx.id)?;
    validate_amount(tx.amount)?;
    validate_date(&tx.date)?;
    validate_category(&tx.category)?;

    if tx.description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(FinError::validation(
            "description",
            format!("description must be at most {} bytes", MAX_DESCRIPTION_LENGTH),
        ));
    }

    for (field, value) in [("person", &tx.person), ("location", &tx.location)] {
        if let Some(v) = value {
            if v.len() > MAX_CONTEXT_FIELD_LENGTH {
                return Err(FinError::validation(
                    field,
                    format!("{} must be at most {} bytes", field, MAX_CONTEXT_FIELD_LENGTH),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    fn sample() -> Transaction {
        Transaction::new(
            50_000.0,
            "Ăn uống",
            "lunch",
            "2025-03-01",
            TransactionType::Expense,
        )
    }

    #[test]
    fn test_valid_transaction_passes() {
        assert!(validate_transaction(&sample()).is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut tx = sample();
        tx.id = String::new();
        assert!(validate_transaction(&tx).is_err());
    }

    #[test]
    fn test_nonpositive_amount_rejected() {
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
        assert!(validate_amount(100.0).is_ok());
    }

    #[test]
    fn test_date_format() {
        assert!(validate_date("2025-01-01").is_ok());
        assert!(validate_date("2025-12-31").is_ok());
        assert!(validate_date("2025-1-1").is_err());
        assert!(validate_date("01-01-2025").is_err());
        assert!(validate_date("2025/01/01").is_err());
        assert!(validate_date("2025-13-01").is_err());
        assert!(validate_date("2025-00-10").is_err());
        assert!(validate_date("2025-01-32").is_err());
        assert!(validate_date("2025é00-1").is_err()); // multi-byte, 10 bytes
    }

    #[test]
    fn test_empty_category_rejected() {
        let mut tx = sample();
        tx.category = "  ".to_string();
        assert!(validate_transaction(&tx).is_err());
    }

    #[test]
    fn test_oversized_description_rejected() {
        let mut tx = sample();
        tx.description = "x".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_transaction(&tx).is_err());
    }
}
