use chrono::NaiveDateTime;
use model::entities::recurring_payment;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::store::LedgerStore;

/// Active recurring payments whose cursor has reached `now`'s date,
/// oldest cursor first (ties broken by id).
#[instrument(skip(store), fields(now = %now))]
pub async fn due_since(
    store: &dyn LedgerStore,
    now: NaiveDateTime,
) -> Result<Vec<recurring_payment::Model>> {
    let mut due = store.list_active_recurring_payments_due_by(now.date()).await?;
    due.sort_by_key(|payment| (payment.next_due_date, payment.id));
    debug!(due = due.len(), "Scanned for due recurring payments");
    Ok(due)
}
