//! Registering and maintaining recurring payments.

use chrono::{NaiveDate, NaiveDateTime};
use model::entities::{expense, recurring_payment};
use model::Frequency;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::error::{LedgerError, Result};
use crate::reconcile::Reconciler;
use crate::store::{LedgerStore, NewRecurringPayment, RecurringPaymentPatch};
use crate::validation;

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringPaymentDraft {
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    /// `weekly`, `monthly` or `yearly`, any case.
    pub frequency: String,
    pub start_date: NaiveDate,
    pub is_active: bool,
}

/// Fields to change on a recurring payment; `None` keeps the current value.
/// Schedule fields are fixed once registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringPaymentUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// A freshly registered payment and the backlog filled for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub payment: recurring_payment::Model,
    pub created: Vec<expense::Model>,
    /// Set when the payment was stored but its backlog could not be filled.
    /// The next batch run picks it up again.
    pub backlog_error: Option<String>,
}

/// Stores a new payment with its cursor on `start_date`, then reconciles it
/// right away unless it was created paused.
#[instrument(skip(reconciler, draft), fields(description = %draft.description, frequency = %draft.frequency))]
pub async fn register_recurring_payment(
    reconciler: &Reconciler,
    draft: RecurringPaymentDraft,
    now: NaiveDateTime,
) -> Result<Registration> {
    let store = reconciler.store();
    let frequency: Frequency = draft.frequency.parse()?;

    let payment = store
        .create_recurring_payment(NewRecurringPayment {
            description: validation::recurring_description(&draft.description)?,
            category: validation::category(&draft.category)?,
            amount: validation::amount(draft.amount)?,
            frequency,
            start_date: draft.start_date,
            next_due_date: draft.start_date,
            is_active: draft.is_active,
            created_at: now,
        })
        .await?;
    info!(payment_id = payment.id, start_date = %payment.start_date, "Registered recurring payment");

    if !payment.is_active() {
        return Ok(Registration {
            payment,
            created: Vec::new(),
            backlog_error: None,
        });
    }

    let (created, backlog_error) = match reconciler.reconcile(&payment, now).await {
        Ok(outcome) => (outcome.created, None),
        Err(err) if err.is_store_failure() => {
            warn!(payment_id = payment.id, error = %err, "Backlog left for the next batch run");
            (Vec::new(), Some(err.to_string()))
        }
        Err(err) => return Err(err),
    };

    let payment = get_recurring_payment(store.as_ref(), payment.id).await?;
    Ok(Registration {
        payment,
        created,
        backlog_error,
    })
}

pub async fn get_recurring_payment(
    store: &dyn LedgerStore,
    id: i32,
) -> Result<recurring_payment::Model> {
    store
        .get_recurring_payment(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Recurring payment", id))
}

pub async fn list_recurring_payments(store: &dyn LedgerStore) -> Result<Vec<recurring_payment::Model>> {
    store.list_recurring_payments().await
}

/// Applies `update`. Resuming a paused payment does not reconcile it here;
/// the next batch run backfills the occurrences it missed.
#[instrument(skip(store, update))]
pub async fn update_recurring_payment(
    store: &dyn LedgerStore,
    id: i32,
    update: RecurringPaymentUpdate,
) -> Result<recurring_payment::Model> {
    let patch = RecurringPaymentPatch {
        description: update
            .description
            .as_deref()
            .map(validation::recurring_description)
            .transpose()?,
        category: update
            .category
            .as_deref()
            .map(validation::category)
            .transpose()?,
        amount: update.amount.map(validation::amount).transpose()?,
        is_active: update.is_active,
        next_due_date: None,
    };
    let payment = store.update_recurring_payment(id, patch).await?;
    info!(active = payment.is_active(), "Updated recurring payment");
    Ok(payment)
}

/// Deletes the payment. Expenses already materialized from it are kept.
#[instrument(skip(reconciler))]
pub async fn delete_recurring_payment(reconciler: &Reconciler, id: i32) -> Result<()> {
    if !reconciler.store().delete_recurring_payment(id).await? {
        return Err(LedgerError::not_found("Recurring payment", id));
    }
    reconciler.forget(id)?;
    info!("Deleted recurring payment");
    Ok(())
}
