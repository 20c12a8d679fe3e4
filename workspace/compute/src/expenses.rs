//! User-facing expense operations.

use chrono::{NaiveDate, NaiveDateTime};
use model::entities::expense;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::error::{LedgerError, Result};
use crate::month::Month;
use crate::store::{ExpenseFilter, ExpensePatch, LedgerStore, NewExpense};
use crate::validation;

/// An expense as entered by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Fields to change on an expense; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[instrument(skip(store, draft), fields(category = %draft.category, date = %draft.date))]
pub async fn create_expense(
    store: &dyn LedgerStore,
    draft: ExpenseDraft,
    now: NaiveDateTime,
) -> Result<expense::Model> {
    let expense = store
        .create_expense(NewExpense {
            description: validation::description(&draft.description)?,
            category: validation::category(&draft.category)?,
            amount: validation::amount(draft.amount)?,
            date: draft.date,
            created_at: now,
            recurring_payment_id: None,
            occurrence_date: None,
        })
        .await?;
    info!(expense_id = expense.id, "Created expense");
    Ok(expense)
}

pub async fn get_expense(store: &dyn LedgerStore, id: i32) -> Result<expense::Model> {
    store
        .get_expense(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Expense", id))
}

/// Expenses ordered by (date, id), optionally narrowed to a category and/or month.
#[instrument(skip(store))]
pub async fn list_expenses(
    store: &dyn LedgerStore,
    category: Option<&str>,
    month: Option<Month>,
) -> Result<Vec<expense::Model>> {
    let mut filter = match month {
        Some(month) => ExpenseFilter::in_month(month),
        None => ExpenseFilter::all(),
    };
    if let Some(category) = category {
        filter = filter.with_category(category.trim());
    }
    let expenses = store.list_expenses(&filter).await?;
    debug!(count = expenses.len(), "Listed expenses");
    Ok(expenses)
}

#[instrument(skip(store, update))]
pub async fn update_expense(
    store: &dyn LedgerStore,
    id: i32,
    update: ExpenseUpdate,
) -> Result<expense::Model> {
    let patch = ExpensePatch {
        description: update
            .description
            .as_deref()
            .map(validation::description)
            .transpose()?,
        category: update
            .category
            .as_deref()
            .map(validation::category)
            .transpose()?,
        amount: update.amount.map(validation::amount).transpose()?,
        date: update.date,
    };
    let expense = store.update_expense(id, patch).await?;
    info!("Updated expense");
    Ok(expense)
}

#[instrument(skip(store))]
pub async fn delete_expense(store: &dyn LedgerStore, id: i32) -> Result<()> {
    if !store.delete_expense(id).await? {
        return Err(LedgerError::not_found("Expense", id));
    }
    info!("Deleted expense");
    Ok(())
}
