//! One pass over every due recurring payment.

use chrono::NaiveDateTime;
use model::entities::expense;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::scanner::due_since;

/// A payment the batch could not bring up to date.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub recurring_payment_id: i32,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Payments reconciled without error.
    pub processed_count: usize,
    pub created_expenses: Vec<expense::Model>,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn is_empty(&self) -> bool {
        self.processed_count == 0 && self.created_expenses.is_empty() && self.failures.is_empty()
    }
}

/// Reconciles every due payment, one after the other.
///
/// A payment that fails is logged and listed in `failures`; the rest are still
/// processed. Only a failure to list the due payments aborts the batch.
#[instrument(skip(reconciler), fields(now = %now))]
pub async fn process_all(reconciler: &Reconciler, now: NaiveDateTime) -> Result<BatchSummary> {
    let due = due_since(reconciler.store().as_ref(), now).await?;
    let mut summary = BatchSummary::default();

    for payment in &due {
        match reconciler.reconcile(payment, now).await {
            Ok(outcome) => {
                summary.processed_count += 1;
                summary.created_expenses.extend(outcome.created);
            }
            Err(err) => {
                error!(payment_id = payment.id, error = %err, "Failed to process recurring payment");
                summary.failures.push(BatchFailure {
                    recurring_payment_id: payment.id,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        due = due.len(),
        processed = summary.processed_count,
        created = summary.created_expenses.len(),
        failed = summary.failures.len(),
        "Recurring payment batch finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ExpenseFilter, LedgerStore};
    use crate::testing::{at, date, insert_payment, store_suite, FailingStore};
    use model::Frequency;
    use std::sync::Arc;

    async fn empty_batch(store: Arc<dyn LedgerStore>) {
        let summary = process_all(&Reconciler::new(store), at(2024, 4, 10)).await.unwrap();

        assert_eq!(summary.processed_count, 0);
        assert!(summary.created_expenses.is_empty());
        assert!(summary.is_empty());
    }

    async fn batch_processes_every_due_payment(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        insert_payment(&*store, "Palestra", Frequency::Weekly, date(2024, 3, 27)).await;
        insert_payment(&*store, "Futuro", Frequency::Yearly, date(2024, 6, 1)).await;

        let summary = process_all(&reconciler, at(2024, 4, 10)).await.unwrap();

        assert_eq!(summary.processed_count, 2);
        // Netflix: 4 monthly, Palestra: Mar 27, Apr 3, Apr 10
        assert_eq!(summary.created_expenses.len(), 7);
        assert!(summary.failures.is_empty());
    }

    async fn batch_is_idempotent_for_fixed_now(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        let now = at(2024, 4, 10);

        let first = process_all(&reconciler, now).await.unwrap();
        let second = process_all(&reconciler, now).await.unwrap();

        assert_eq!(first.created_expenses.len(), 4);
        assert_eq!(second, BatchSummary::default());
        let all = store.list_expenses(&ExpenseFilter::all()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    async fn failing_payment_does_not_stop_the_batch(store: Arc<dyn LedgerStore>) {
        let broken = insert_payment(&*store, "Rotto", Frequency::Monthly, date(2024, 1, 1)).await;
        let healthy = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        let flaky: Arc<dyn LedgerStore> = Arc::new(FailingStore::fail_expenses_for(store.clone(), broken.id));

        let summary = process_all(&Reconciler::new(flaky), at(2024, 4, 10)).await.unwrap();

        assert_eq!(summary.processed_count, 1);
        assert_eq!(summary.created_expenses.len(), 4);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].recurring_payment_id, broken.id);
        assert!(summary
            .created_expenses
            .iter()
            .all(|e| e.recurring_payment_id == Some(healthy.id)));

        let broken_now = store.get_recurring_payment(broken.id).await.unwrap().unwrap();
        assert_eq!(broken_now.next_due_date, date(2024, 1, 1));
    }

    store_suite!(
        empty_batch,
        batch_processes_every_due_payment,
        batch_is_idempotent_for_fixed_now,
        failing_payment_does_not_stop_the_batch,
    );
}
