//! Input checks shared by the expense, budget and recurring payment services.

use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::guard::BACKLOG_MARKER;

pub const MAX_DESCRIPTION_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Longest recurring description whose materialized form still fits an expense.
pub const MAX_RECURRING_DESCRIPTION_LEN: usize = MAX_DESCRIPTION_LEN - BACKLOG_MARKER.len() - 1;

fn non_empty_text(field: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(LedgerError::validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

pub fn description(value: &str) -> Result<String> {
    non_empty_text("description", value, MAX_DESCRIPTION_LEN)
}

pub fn recurring_description(value: &str) -> Result<String> {
    non_empty_text("description", value, MAX_RECURRING_DESCRIPTION_LEN)
}

pub fn category(value: &str) -> Result<String> {
    non_empty_text("category", value, MAX_CATEGORY_LEN)
}

/// Positive, at most two fractional digits; returned with exactly two.
pub fn amount(value: Decimal) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount must be positive, got {}",
            value
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(LedgerError::validation(format!(
            "amount must have at most 2 decimal places, got {}",
            value
        )));
    }
    let mut rescaled = value;
    rescaled.rescale(2);
    Ok(rescaled)
}
