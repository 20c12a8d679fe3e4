//! Persistence seam for expenses, budgets and recurring payments.
//!
//! The reconciler only talks to [`LedgerStore`], so the in-memory and the
//! relational implementation are interchangeable. Both must:
//! - assign ids from a per-table counter that never reuses a value,
//! - make every successful write visible to the next read,
//! - return lists in the same order (see each method).

pub mod database;
pub mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use model::entities::{budget, expense, recurring_payment};
use model::Frequency;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::month::Month;

/// Fractional digits of every amount a store hands out.
pub const MONEY_SCALE: u32 = 2;

/// `amount` at [`MONEY_SCALE`] digits, whatever scale the backend returned.
pub(crate) fn money(mut amount: Decimal) -> Decimal {
    amount.rescale(MONEY_SCALE);
    amount
}

/// Fields of an expense about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub recurring_payment_id: Option<i32>,
    pub occurrence_date: Option<NaiveDate>,
}

/// Partial update of an expense; `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.date.is_none()
    }
}

/// Expense selection. All set criteria must hold; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub recurring_payment_id: Option<i32>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn in_month(month: Month) -> Self {
        Self::between(month.first_day(), month.last_day())
    }

    pub fn owned_by(recurring_payment_id: i32) -> Self {
        Self {
            recurring_payment_id: Some(recurring_payment_id),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, expense: &expense::Model) -> bool {
        self.category.as_ref().is_none_or(|c| *c == expense.category)
            && self.from.is_none_or(|from| expense.date >= from)
            && self.to.is_none_or(|to| expense.date <= to)
            && self
                .recurring_payment_id
                .is_none_or(|id| expense.recurring_payment_id == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category: String,
    pub limit: Decimal,
    pub month: String,
}

/// Fields of a recurring payment about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringPayment {
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Partial update of a recurring payment; `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringPaymentPatch {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub is_active: Option<bool>,
    pub next_due_date: Option<NaiveDate>,
}

impl RecurringPaymentPatch {
    pub fn cursor(next_due_date: NaiveDate) -> Self {
        Self {
            next_due_date: Some(next_due_date),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.is_active.is_none()
            && self.next_due_date.is_none()
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Checks that the backing storage answers.
    async fn ping(&self) -> Result<()>;

    async fn create_expense(&self, expense: NewExpense) -> Result<expense::Model>;

    async fn get_expense(&self, id: i32) -> Result<Option<expense::Model>>;

    /// Ordered by (date, id).
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<expense::Model>>;

    /// Fails with `NotFound` for an unknown id.
    async fn update_expense(&self, id: i32, patch: ExpensePatch) -> Result<expense::Model>;

    /// Returns false when there was nothing to delete.
    async fn delete_expense(&self, id: i32) -> Result<bool>;

    async fn create_budget(&self, budget: NewBudget) -> Result<budget::Model>;

    async fn get_budget(&self, id: i32) -> Result<Option<budget::Model>>;

    async fn find_budget(&self, category: &str, month: &str) -> Result<Option<budget::Model>>;

    /// Ordered by (month, category, id).
    async fn list_budgets(&self, month: Option<&str>) -> Result<Vec<budget::Model>>;

    async fn update_budget_limit(&self, id: i32, limit: Decimal) -> Result<budget::Model>;

    async fn delete_budget(&self, id: i32) -> Result<bool>;

    async fn create_recurring_payment(
        &self,
        payment: NewRecurringPayment,
    ) -> Result<recurring_payment::Model>;

    async fn get_recurring_payment(&self, id: i32) -> Result<Option<recurring_payment::Model>>;

    /// Ordered by id.
    async fn list_recurring_payments(&self) -> Result<Vec<recurring_payment::Model>>;

    /// Fails with `NotFound` for an unknown id.
    async fn update_recurring_payment(
        &self,
        id: i32,
        patch: RecurringPaymentPatch,
    ) -> Result<recurring_payment::Model>;

    /// Leaves materialized expenses untouched.
    async fn delete_recurring_payment(&self, id: i32) -> Result<bool>;

    /// Active payments with `next_due_date <= date`, ordered by (next_due_date, id).
    async fn list_active_recurring_payments_due_by(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<recurring_payment::Model>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Reconciler;
    use crate::testing::{at, date, insert_payment, manual_expense, store_suite};
    use std::sync::Arc;

    async fn amounts_keep_two_decimals(store: Arc<dyn LedgerStore>) {
        let whole = store
            .create_expense(manual_expense("Spesa", "Cibo", 4500, date(2024, 3, 2)))
            .await
            .unwrap();
        let large = store
            .create_expense(manual_expense("Auto", "Trasporti", 123456789012, date(2024, 3, 3)))
            .await
            .unwrap();
        assert_eq!(whole.amount.to_string(), "45.00");
        assert_eq!(large.amount.to_string(), "1234567890.12");

        let fetched = store.get_expense(whole.id).await.unwrap().unwrap();
        assert_eq!(fetched.amount.to_string(), "45.00");

        let patched = store
            .update_expense(
                whole.id,
                ExpensePatch {
                    amount: Some(Decimal::new(5, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.amount.to_string(), "5.00");

        let payment = insert_payment(&*store, "Netflix", Frequency::Monthly, date(2024, 3, 10)).await;
        let outcome = Reconciler::new(store.clone())
            .reconcile(&payment, at(2024, 3, 10))
            .await
            .unwrap();
        assert_eq!(outcome.created[0].amount.to_string(), "12.99");

        let listed: Vec<String> = store
            .list_expenses(&ExpenseFilter::all())
            .await
            .unwrap()
            .iter()
            .map(|e| e.amount.to_string())
            .collect();
        assert_eq!(listed, vec!["5.00", "1234567890.12", "12.99"]);

        let budget = store
            .create_budget(NewBudget {
                category: "Cibo".to_string(),
                limit: Decimal::new(100, 0),
                month: "2024-03".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(budget.limit.to_string(), "100.00");
        let raised = store.update_budget_limit(budget.id, Decimal::new(150, 0)).await.unwrap();
        assert_eq!(raised.limit.to_string(), "150.00");
        let found = store.find_budget("Cibo", "2024-03").await.unwrap().unwrap();
        assert_eq!(found.limit.to_string(), "150.00");

        let payments = store.list_recurring_payments().await.unwrap();
        assert_eq!(payments[0].amount.to_string(), "12.99");
    }

    store_suite!(amounts_keep_two_decimals);
}
