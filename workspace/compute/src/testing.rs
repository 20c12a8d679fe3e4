//! Fixtures shared by the unit tests. Every reconciliation scenario runs once
//! per store implementation through [`store_suite!`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use model::entities::{budget, expense, recurring_payment};
use model::Frequency;
use rust_decimal::Decimal;
use sea_orm::Database;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::error::{LedgerError, Result};
use crate::store::{
    DatabaseStore, ExpenseFilter, ExpensePatch, LedgerStore, MemoryStore, NewBudget, NewExpense,
    NewRecurringPayment, RecurringPaymentPatch,
};

/// Generates one `#[tokio::test]` per scenario and store implementation.
/// Each scenario is an `async fn(Arc<dyn LedgerStore>)` in the calling module.
macro_rules! store_suite {
    ($($scenario:ident),* $(,)?) => {
        mod memory_store {
            $(
                #[tokio::test]
                async fn $scenario() {
                    let _tracing = $crate::testing::init_test_tracing();
                    super::$scenario($crate::testing::memory_store()).await;
                }
            )*
        }

        mod database_store {
            $(
                #[tokio::test]
                async fn $scenario() {
                    let _tracing = $crate::testing::init_test_tracing();
                    super::$scenario($crate::testing::database_store().await).await;
                }
            )*
        }
    };
}
pub(crate) use store_suite;

/// Logs to stderr at the level named by RUST_LOG, WARN otherwise.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub fn memory_store() -> Arc<dyn LedgerStore> {
    Arc::new(MemoryStore::new())
}

pub async fn database_store() -> Arc<dyn LedgerStore> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    Arc::new(DatabaseStore::new(db))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Morning of the given day.
pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(9, 0, 0).unwrap()
}

/// Inserts an active payment straight into the store, cursor on its start date.
pub async fn insert_payment(
    store: &dyn LedgerStore,
    description: &str,
    frequency: Frequency,
    start_date: NaiveDate,
) -> recurring_payment::Model {
    store
        .create_recurring_payment(NewRecurringPayment {
            description: description.to_string(),
            category: "Abbonamenti".to_string(),
            amount: Decimal::new(1299, 2),
            frequency,
            start_date,
            next_due_date: start_date,
            is_active: true,
            created_at: start_date.and_hms_opt(0, 0, 0).unwrap(),
        })
        .await
        .expect("Failed to insert recurring payment")
}

pub fn manual_expense(description: &str, category: &str, cents: i64, on: NaiveDate) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        category: category.to_string(),
        amount: Decimal::new(cents, 2),
        date: on,
        created_at: on.and_hms_opt(12, 0, 0).unwrap(),
        recurring_payment_id: None,
        occurrence_date: None,
    }
}

/// Wraps a store and makes expense creation fail on demand.
pub struct FailingStore {
    inner: Arc<dyn LedgerStore>,
    /// Expense creations allowed before every further one fails.
    remaining_creates: Option<AtomicUsize>,
    /// Expenses owned by this payment can never be created.
    failing_payment: Option<i32>,
}

impl FailingStore {
    pub fn fail_expenses_after(inner: Arc<dyn LedgerStore>, allowed: usize) -> Self {
        Self {
            inner,
            remaining_creates: Some(AtomicUsize::new(allowed)),
            failing_payment: None,
        }
    }

    pub fn fail_expenses_for(inner: Arc<dyn LedgerStore>, payment_id: i32) -> Self {
        Self {
            inner,
            remaining_creates: None,
            failing_payment: Some(payment_id),
        }
    }

    fn injected() -> LedgerError {
        LedgerError::Store("injected failure".to_string())
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn create_expense(&self, expense: NewExpense) -> Result<expense::Model> {
        if self.failing_payment.is_some() && expense.recurring_payment_id == self.failing_payment {
            return Err(Self::injected());
        }
        if let Some(remaining) = &self.remaining_creates {
            let allowed = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(Self::injected());
            }
        }
        self.inner.create_expense(expense).await
    }

    async fn get_expense(&self, id: i32) -> Result<Option<expense::Model>> {
        self.inner.get_expense(id).await
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<expense::Model>> {
        self.inner.list_expenses(filter).await
    }

    async fn update_expense(&self, id: i32, patch: ExpensePatch) -> Result<expense::Model> {
        self.inner.update_expense(id, patch).await
    }

    async fn delete_expense(&self, id: i32) -> Result<bool> {
        self.inner.delete_expense(id).await
    }

    async fn create_budget(&self, budget: NewBudget) -> Result<budget::Model> {
        self.inner.create_budget(budget).await
    }

    async fn get_budget(&self, id: i32) -> Result<Option<budget::Model>> {
        self.inner.get_budget(id).await
    }

    async fn find_budget(&self, category: &str, month: &str) -> Result<Option<budget::Model>> {
        self.inner.find_budget(category, month).await
    }

    async fn list_budgets(&self, month: Option<&str>) -> Result<Vec<budget::Model>> {
        self.inner.list_budgets(month).await
    }

    async fn update_budget_limit(&self, id: i32, limit: Decimal) -> Result<budget::Model> {
        self.inner.update_budget_limit(id, limit).await
    }

    async fn delete_budget(&self, id: i32) -> Result<bool> {
        self.inner.delete_budget(id).await
    }

    async fn create_recurring_payment(
        &self,
        payment: NewRecurringPayment,
    ) -> Result<recurring_payment::Model> {
        self.inner.create_recurring_payment(payment).await
    }

    async fn get_recurring_payment(&self, id: i32) -> Result<Option<recurring_payment::Model>> {
        self.inner.get_recurring_payment(id).await
    }

    async fn list_recurring_payments(&self) -> Result<Vec<recurring_payment::Model>> {
        self.inner.list_recurring_payments().await
    }

    async fn update_recurring_payment(
        &self,
        id: i32,
        patch: RecurringPaymentPatch,
    ) -> Result<recurring_payment::Model> {
        self.inner.update_recurring_payment(id, patch).await
    }

    async fn delete_recurring_payment(&self, id: i32) -> Result<bool> {
        self.inner.delete_recurring_payment(id).await
    }

    async fn list_active_recurring_payments_due_by(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<recurring_payment::Model>> {
        self.inner.list_active_recurring_payments_due_by(date).await
    }
}
