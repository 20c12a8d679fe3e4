pub mod budgets;
pub mod expenses;
pub mod health;
pub mod recurring_payments;

use compute::Month;

use crate::schemas::{error_response, ApiError};

/// Parses a `YYYY-MM` query value into a month, or answers 400.
pub(crate) fn parse_month(raw: &str) -> Result<Month, ApiError> {
    raw.parse::<Month>().map_err(error_response)
}
