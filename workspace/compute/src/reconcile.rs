//! Backlog reconciliation of a single recurring payment.
//!
//! Reconciling walks every occurrence from the payment's cursor up to today,
//! creates the expenses that are still missing and moves the cursor one period
//! past the last occurrence it looked at.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use model::entities::{expense, recurring_payment};
use model::occurrences;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, Result};
use crate::guard::{is_already_materialized, materialized_description};
use crate::locks::KeyedLocks;
use crate::store::{ExpenseFilter, LedgerStore, NewExpense, RecurringPaymentPatch};

/// What one reconciliation did.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub payment_id: i32,
    /// Expenses created by this run, in occurrence order.
    pub created: Vec<expense::Model>,
    pub next_due_date: NaiveDate,
}

impl ReconcileOutcome {
    fn untouched(payment: &recurring_payment::Model) -> Self {
        Self {
            payment_id: payment.id,
            created: Vec::new(),
            next_due_date: payment.next_due_date,
        }
    }
}

/// Materializes missing occurrences. Runs for the same payment id never overlap.
pub struct Reconciler {
    store: Arc<dyn LedgerStore>,
    locks: KeyedLocks<i32>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Brings `payment` up to date as of `now`.
    ///
    /// Only the id of `payment` is trusted: the record is read again under the
    /// payment's lock, so a stale copy cannot move the cursor backwards. A paused
    /// payment is left alone. On a store failure the expenses created so far
    /// stay, the cursor keeps its old value and the error is returned; running
    /// again later skips what already exists.
    #[instrument(skip(self, payment), fields(payment_id = payment.id, now = %now))]
    pub async fn reconcile(
        &self,
        payment: &recurring_payment::Model,
        now: NaiveDateTime,
    ) -> Result<ReconcileOutcome> {
        let _lock = self.locks.acquire(payment.id).await?;

        let payment = self
            .store
            .get_recurring_payment(payment.id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Recurring payment", payment.id))?;

        if !payment.is_active() {
            debug!("Recurring payment is paused, skipping");
            return Ok(ReconcileOutcome::untouched(&payment));
        }

        let today = now.date();
        let cursor = payment.next_due_date.max(payment.start_date);
        let candidates: Vec<NaiveDate> = occurrences(payment.frequency, cursor, today).collect();

        let Some(&last) = candidates.last() else {
            trace!(next_due_date = %payment.next_due_date, "Nothing due yet");
            return Ok(ReconcileOutcome::untouched(&payment));
        };

        debug!(
            cursor = %cursor,
            candidates = candidates.len(),
            frequency = %payment.frequency,
            "Reconciling recurring payment"
        );

        // Expenses this payment already owns, plus unlinked ones in the window
        // that the text heuristic may recognise
        let mut existing = self
            .store
            .list_expenses(&ExpenseFilter::owned_by(payment.id))
            .await?;
        let unlinked = self
            .store
            .list_expenses(&ExpenseFilter::between(cursor, today))
            .await?
            .into_iter()
            .filter(|expense| expense.recurring_payment_id.is_none());
        existing.extend(unlinked);

        let mut created = Vec::new();
        for occurrence in candidates {
            if is_already_materialized(&existing, &payment, occurrence) {
                trace!(occurrence = %occurrence, "Occurrence already materialized");
                continue;
            }

            let expense = self
                .store
                .create_expense(NewExpense {
                    description: materialized_description(&payment.description, occurrence, today),
                    category: payment.category.clone(),
                    amount: payment.amount,
                    date: occurrence,
                    created_at: now,
                    recurring_payment_id: Some(payment.id),
                    occurrence_date: Some(occurrence),
                })
                .await
                .inspect_err(|err| {
                    warn!(occurrence = %occurrence, error = %err, "Failed to materialize occurrence");
                })?;

            trace!(expense_id = expense.id, occurrence = %occurrence, "Materialized occurrence");
            existing.push(expense.clone());
            created.push(expense);
        }

        let next_due_date = payment.frequency.advance(last).ok_or_else(|| {
            LedgerError::Date(format!(
                "cannot advance {} by one {} period",
                last, payment.frequency
            ))
        })?;
        self.store
            .update_recurring_payment(payment.id, RecurringPaymentPatch::cursor(next_due_date))
            .await?;

        info!(
            created = created.len(),
            next_due_date = %next_due_date,
            "Recurring payment reconciled"
        );

        Ok(ReconcileOutcome {
            payment_id: payment.id,
            created,
            next_due_date,
        })
    }

    /// Drops the lock entry of a deleted payment.
    pub fn forget(&self, payment_id: i32) -> Result<()> {
        self.locks.forget(&payment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{BACKLOG_MARKER, LIVE_MARKER};
    use crate::testing::{at, date, insert_payment, manual_expense, store_suite, FailingStore};
    use model::Frequency;
    use rust_decimal::Decimal;

    async fn cursor_of(store: &dyn LedgerStore, id: i32) -> NaiveDate {
        store
            .get_recurring_payment(id)
            .await
            .unwrap()
            .unwrap()
            .next_due_date
    }

    async fn owned(store: &dyn LedgerStore, id: i32) -> Vec<expense::Model> {
        store
            .list_expenses(&ExpenseFilter::owned_by(id))
            .await
            .unwrap()
    }

    async fn netflix_scenario(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;

        let outcome = reconciler.reconcile(&payment, at(2024, 4, 10)).await.unwrap();

        assert_eq!(outcome.created.len(), 4);
        assert_eq!(outcome.next_due_date, date(2024, 5, 10));
        let dates: Vec<_> = outcome.created.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 10),
                date(2024, 2, 10),
                date(2024, 3, 10),
                date(2024, 4, 10)
            ]
        );
        for expense in &outcome.created[..3] {
            assert_eq!(expense.description, format!("Netflix {}", BACKLOG_MARKER));
        }
        assert_eq!(outcome.created[3].description, format!("Netflix {}", LIVE_MARKER));
        for expense in &outcome.created {
            assert_eq!(expense.category, "Abbonamenti");
            assert_eq!(expense.amount, Decimal::new(1299, 2));
            assert_eq!(expense.recurring_payment_id, Some(payment.id));
            assert_eq!(expense.occurrence_date, Some(expense.date));
        }
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 5, 10));
    }

    async fn completeness_after_five_months(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Affitto", Frequency::Monthly, date(2023, 6, 15)).await;

        let outcome = reconciler.reconcile(&payment, at(2023, 11, 15)).await.unwrap();

        assert_eq!(outcome.created.len(), 6);
        assert_eq!(outcome.next_due_date, date(2023, 12, 15));
        assert_eq!(owned(&*store, payment.id).await.len(), 6);
    }

    async fn reconcile_is_idempotent(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Palestra", Frequency::Weekly, date(2024, 3, 1)).await;
        let now = at(2024, 3, 29);

        let first = reconciler.reconcile(&payment, now).await.unwrap();
        let second = reconciler.reconcile(&payment, now).await.unwrap();

        assert_eq!(first.created.len(), 5);
        assert!(second.created.is_empty());
        assert_eq!(second.next_due_date, first.next_due_date);
        assert_eq!(owned(&*store, payment.id).await.len(), 5);
    }

    async fn stale_copy_never_moves_cursor_back(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let stale = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;

        reconciler.reconcile(&stale, at(2024, 4, 10)).await.unwrap();
        // The caller still holds the record with the cursor on 2024-01-10
        let again = reconciler.reconcile(&stale, at(2024, 4, 10)).await.unwrap();

        assert!(again.created.is_empty());
        assert_eq!(again.next_due_date, date(2024, 5, 10));
        assert_eq!(cursor_of(&*store, stale.id).await, date(2024, 5, 10));
        assert_eq!(owned(&*store, stale.id).await.len(), 4);
    }

    async fn cursor_advances_without_new_expenses(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Spotify", Frequency::Monthly, date(2024, 2, 1)).await;
        store
            .create_expense(NewExpense {
                description: format!("Spotify {}", LIVE_MARKER),
                ..manual_expense("", "Abbonamenti", 999, date(2024, 2, 1))
            })
            .await
            .unwrap();

        let outcome = reconciler.reconcile(&payment, at(2024, 2, 1)).await.unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.next_due_date, date(2024, 3, 1));
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 3, 1));
    }

    async fn future_cursor_is_left_alone(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Assicurazione", Frequency::Yearly, date(2024, 9, 1)).await;

        let outcome = reconciler.reconcile(&payment, at(2024, 8, 31)).await.unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.next_due_date, date(2024, 9, 1));
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 9, 1));
    }

    async fn clamped_day_carries_forward(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Mutuo", Frequency::Monthly, date(2024, 1, 31)).await;

        let outcome = reconciler.reconcile(&payment, at(2024, 4, 30)).await.unwrap();

        let dates: Vec<_> = outcome.created.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 29),
                date(2024, 4, 29)
            ]
        );
        assert_eq!(outcome.next_due_date, date(2024, 5, 29));
    }

    async fn paused_payment_is_skipped(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        store
            .update_recurring_payment(
                payment.id,
                RecurringPaymentPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = reconciler.reconcile(&payment, at(2024, 4, 10)).await.unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.next_due_date, date(2024, 1, 10));
        assert!(owned(&*store, payment.id).await.is_empty());
    }

    async fn renamed_expense_still_counts(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        let first = reconciler.reconcile(&payment, at(2024, 1, 10)).await.unwrap();
        store
            .update_expense(
                first.created[0].id,
                crate::store::ExpensePatch {
                    description: Some("Streaming gennaio".to_string()),
                    date: Some(date(2024, 1, 12)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // Rewind the cursor as if an older run had never persisted it
        store
            .update_recurring_payment(payment.id, RecurringPaymentPatch::cursor(date(2024, 1, 10)))
            .await
            .unwrap();

        let outcome = reconciler.reconcile(&payment, at(2024, 2, 10)).await.unwrap();

        let dates: Vec<_> = outcome.created.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 2, 10)]);
    }

    async fn partial_failure_keeps_cursor_and_retry_fills_gap(store: Arc<dyn LedgerStore>) {
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        let flaky: Arc<dyn LedgerStore> = Arc::new(FailingStore::fail_expenses_after(store.clone(), 2));

        let err = Reconciler::new(flaky)
            .reconcile(&payment, at(2024, 4, 10))
            .await
            .unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(owned(&*store, payment.id).await.len(), 2);
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 1, 10));

        let retry = Reconciler::new(store.clone())
            .reconcile(&payment, at(2024, 4, 10))
            .await
            .unwrap();

        let dates: Vec<_> = retry.created.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 3, 10), date(2024, 4, 10)]);
        assert_eq!(owned(&*store, payment.id).await.len(), 4);
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 5, 10));
    }

    async fn concurrent_runs_create_each_occurrence_once(store: Arc<dyn LedgerStore>) {
        let reconciler = Arc::new(Reconciler::new(store.clone()));
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        let now = at(2024, 4, 10);

        let (a, b) = tokio::join!(
            reconciler.reconcile(&payment, now),
            reconciler.reconcile(&payment, now)
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.created.len() + b.created.len(), 4);
        assert_eq!(owned(&*store, payment.id).await.len(), 4);
        assert_eq!(cursor_of(&*store, payment.id).await, date(2024, 5, 10));
    }

    async fn deleted_payment_is_not_found(store: Arc<dyn LedgerStore>) {
        let reconciler = Reconciler::new(store.clone());
        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 1, 10)).await;
        assert!(store.delete_recurring_payment(payment.id).await.unwrap());
        reconciler.forget(payment.id).unwrap();

        let err = reconciler.reconcile(&payment, at(2024, 4, 10)).await.unwrap_err();

        assert!(matches!(err, LedgerError::NotFound { .. }));
        assert!(owned(&*store, payment.id).await.is_empty());
    }

    store_suite!(
        netflix_scenario,
        completeness_after_five_months,
        reconcile_is_idempotent,
        stale_copy_never_moves_cursor_back,
        cursor_advances_without_new_expenses,
        future_cursor_is_left_alone,
        clamped_day_carries_forward,
        paused_payment_is_skipped,
        renamed_expense_still_counts,
        partial_failure_keeps_cursor_and_retry_fills_gap,
        concurrent_runs_create_each_occurrence_once,
        deleted_payment_is_not_found,
    );
}
