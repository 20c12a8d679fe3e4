//! Decides whether an occurrence of a recurring payment already has its expense.
//!
//! Expenses created by the reconciler carry `recurring_payment_id` and
//! `occurrence_date`, and those two fields are matched exactly. Expenses
//! without an owner (entered by hand or imported from older data) fall back to
//! matching the date and the description text, which can misfire when a user
//! types a look-alike description. That limitation is accepted.

use chrono::NaiveDate;
use model::entities::{expense, recurring_payment};

/// Suffix of expenses materialized for a date already in the past.
pub const BACKLOG_MARKER: &str = "(Automatic - Backlog)";
/// Suffix of expenses materialized on their due date.
pub const LIVE_MARKER: &str = "(Automatic)";

/// Description of the expense materializing `occurrence`, seen from `today`.
pub fn materialized_description(base: &str, occurrence: NaiveDate, today: NaiveDate) -> String {
    let marker = if occurrence < today {
        BACKLOG_MARKER
    } else {
        LIVE_MARKER
    };
    format!("{} {}", base, marker)
}

pub fn is_already_materialized(
    existing: &[expense::Model],
    payment: &recurring_payment::Model,
    occurrence: NaiveDate,
) -> bool {
    existing
        .iter()
        .any(|expense| stands_for(expense, payment, occurrence))
}

fn stands_for(
    expense: &expense::Model,
    payment: &recurring_payment::Model,
    occurrence: NaiveDate,
) -> bool {
    match expense.recurring_payment_id {
        Some(_) => expense.materializes(payment.id, occurrence),
        None => {
            expense.date == occurrence
                && expense.description.contains(payment.description.as_str())
                && (expense.description.contains(BACKLOG_MARKER)
                    || expense.description.contains(LIVE_MARKER))
        }
    }
}
