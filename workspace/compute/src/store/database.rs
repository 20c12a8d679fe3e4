use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::{budget, expense, recurring_payment};
use model::ActiveFlag;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{instrument, trace};

use super::{
    money, ExpenseFilter, ExpensePatch, LedgerStore, NewBudget, NewExpense, NewRecurringPayment,
    RecurringPaymentPatch,
};
use crate::error::{LedgerError, Result};

// SQLite hands decimals back through f64, so "45.00" would come back as "45".
fn expense_row(mut expense: expense::Model) -> expense::Model {
    expense.amount = money(expense.amount);
    expense
}

fn budget_row(mut budget: budget::Model) -> budget::Model {
    budget.limit = money(budget.limit);
    budget
}

fn payment_row(mut payment: recurring_payment::Model) -> recurring_payment::Model {
    payment.amount = money(payment.amount);
    payment
}

/// Durable store backed by any SeaORM connection (SQLite by default).
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn find_expense(&self, id: i32) -> Result<expense::Model> {
        expense::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(expense_row)
            .ok_or_else(|| LedgerError::not_found("Expense", id))
    }

    async fn find_recurring_payment(&self, id: i32) -> Result<recurring_payment::Model> {
        recurring_payment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(payment_row)
            .ok_or_else(|| LedgerError::not_found("Recurring payment", id))
    }
}

#[async_trait]
impl LedgerStore for DatabaseStore {
    async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    #[instrument(skip(self, new), fields(date = %new.date))]
    async fn create_expense(&self, new: NewExpense) -> Result<expense::Model> {
        let expense = expense::ActiveModel {
            description: Set(new.description),
            category: Set(new.category),
            amount: Set(new.amount),
            date: Set(new.date),
            created_at: Set(new.created_at),
            recurring_payment_id: Set(new.recurring_payment_id),
            occurrence_date: Set(new.occurrence_date),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        trace!(expense_id = expense.id, "Inserted expense");
        Ok(expense_row(expense))
    }

    async fn get_expense(&self, id: i32) -> Result<Option<expense::Model>> {
        Ok(expense::Entity::find_by_id(id).one(&self.db).await?.map(expense_row))
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<expense::Model>> {
        let mut query = expense::Entity::find();
        if let Some(category) = &filter.category {
            query = query.filter(expense::Column::Category.eq(category.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(expense::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expense::Column::Date.lte(to));
        }
        if let Some(owner) = filter.recurring_payment_id {
            query = query.filter(expense::Column::RecurringPaymentId.eq(owner));
        }

        let expenses = query
            .order_by_asc(expense::Column::Date)
            .order_by_asc(expense::Column::Id)
            .all(&self.db)
            .await?;
        Ok(expenses.into_iter().map(expense_row).collect())
    }

    async fn update_expense(&self, id: i32, patch: ExpensePatch) -> Result<expense::Model> {
        let existing = self.find_expense(id).await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let mut active: expense::ActiveModel = existing.into();
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = patch.date {
            active.date = Set(date);
        }
        Ok(expense_row(active.update(&self.db).await?))
    }

    async fn delete_expense(&self, id: i32) -> Result<bool> {
        let result = expense::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn create_budget(&self, new: NewBudget) -> Result<budget::Model> {
        let budget = budget::ActiveModel {
            category: Set(new.category),
            limit: Set(new.limit),
            month: Set(new.month),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(budget_row(budget))
    }

    async fn get_budget(&self, id: i32) -> Result<Option<budget::Model>> {
        Ok(budget::Entity::find_by_id(id).one(&self.db).await?.map(budget_row))
    }

    async fn find_budget(&self, category: &str, month: &str) -> Result<Option<budget::Model>> {
        Ok(budget::Entity::find()
            .filter(budget::Column::Category.eq(category))
            .filter(budget::Column::Month.eq(month))
            .order_by_asc(budget::Column::Id)
            .one(&self.db)
            .await?
            .map(budget_row))
    }

    async fn list_budgets(&self, month: Option<&str>) -> Result<Vec<budget::Model>> {
        let mut query = budget::Entity::find();
        if let Some(month) = month {
            query = query.filter(budget::Column::Month.eq(month));
        }
        let budgets = query
            .order_by_asc(budget::Column::Month)
            .order_by_asc(budget::Column::Category)
            .order_by_asc(budget::Column::Id)
            .all(&self.db)
            .await?;
        Ok(budgets.into_iter().map(budget_row).collect())
    }

    async fn update_budget_limit(&self, id: i32, limit: Decimal) -> Result<budget::Model> {
        let existing = budget::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::not_found("Budget", id))?;
        let mut active: budget::ActiveModel = existing.into();
        active.limit = Set(limit);
        Ok(budget_row(active.update(&self.db).await?))
    }

    async fn delete_budget(&self, id: i32) -> Result<bool> {
        let result = budget::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn create_recurring_payment(
        &self,
        new: NewRecurringPayment,
    ) -> Result<recurring_payment::Model> {
        let payment = recurring_payment::ActiveModel {
            description: Set(new.description),
            category: Set(new.category),
            amount: Set(new.amount),
            frequency: Set(new.frequency),
            start_date: Set(new.start_date),
            next_due_date: Set(new.next_due_date),
            is_active: Set(ActiveFlag::from(new.is_active)),
            created_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(payment_row(payment))
    }

    async fn get_recurring_payment(&self, id: i32) -> Result<Option<recurring_payment::Model>> {
        Ok(recurring_payment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(payment_row))
    }

    async fn list_recurring_payments(&self) -> Result<Vec<recurring_payment::Model>> {
        let payments = recurring_payment::Entity::find()
            .order_by_asc(recurring_payment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(payments.into_iter().map(payment_row).collect())
    }

    #[instrument(skip(self, patch))]
    async fn update_recurring_payment(
        &self,
        id: i32,
        patch: RecurringPaymentPatch,
    ) -> Result<recurring_payment::Model> {
        let existing = self.find_recurring_payment(id).await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let mut active: recurring_payment::ActiveModel = existing.into();
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(ActiveFlag::from(is_active));
        }
        if let Some(next_due_date) = patch.next_due_date {
            active.next_due_date = Set(next_due_date);
        }
        Ok(payment_row(active.update(&self.db).await?))
    }

    async fn delete_recurring_payment(&self, id: i32) -> Result<bool> {
        let result = recurring_payment::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_active_recurring_payments_due_by(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<recurring_payment::Model>> {
        let payments = recurring_payment::Entity::find()
            .filter(recurring_payment::Column::IsActive.eq(ActiveFlag::Active))
            .filter(recurring_payment::Column::NextDueDate.lte(date))
            .order_by_asc(recurring_payment::Column::NextDueDate)
            .order_by_asc(recurring_payment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(payments.into_iter().map(payment_row).collect())
    }
}
