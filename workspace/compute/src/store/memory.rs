use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::{budget, expense, recurring_payment};
use model::ActiveFlag;
use rust_decimal::Decimal;
use tracing::trace;

use super::{
    money, ExpenseFilter, ExpensePatch, LedgerStore, NewBudget, NewExpense, NewRecurringPayment,
    RecurringPaymentPatch,
};
use crate::error::{LedgerError, Result};

/// Id-indexed table with its own counter. Ids start at 1 and are never reused.
#[derive(Debug)]
struct Arena<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Arena<T> {
    fn insert_with(&mut self, build: impl FnOnce(i32) -> T) -> Result<T> {
        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| LedgerError::Store("id space exhausted".to_string()))?;
        self.last_id = id;
        let row = build(id);
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    fn get(&self, id: i32) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn remove(&mut self, id: i32) -> bool {
        self.rows.remove(&id).is_some()
    }
}

#[derive(Debug, Default)]
struct Tables {
    expenses: Arena<expense::Model>,
    budgets: Arena<budget::Model>,
    recurring_payments: Arena<recurring_payment::Model>,
}

/// Transient store. Counters and rows of all three tables sit behind one
/// mutex, so id assignment and insertion happen in the same critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        Ok(self.tables.lock()?)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    async fn create_expense(&self, new: NewExpense) -> Result<expense::Model> {
        let mut tables = self.lock()?;
        let expense = tables.expenses.insert_with(|id| expense::Model {
            id,
            description: new.description,
            category: new.category,
            amount: money(new.amount),
            date: new.date,
            created_at: new.created_at,
            recurring_payment_id: new.recurring_payment_id,
            occurrence_date: new.occurrence_date,
        })?;
        trace!(expense_id = expense.id, "Inserted expense into memory store");
        Ok(expense)
    }

    async fn get_expense(&self, id: i32) -> Result<Option<expense::Model>> {
        Ok(self.lock()?.expenses.get(id))
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<expense::Model>> {
        let tables = self.lock()?;
        let mut expenses: Vec<_> = tables
            .expenses
            .rows
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        expenses.sort_by_key(|e| (e.date, e.id));
        Ok(expenses)
    }

    async fn update_expense(&self, id: i32, patch: ExpensePatch) -> Result<expense::Model> {
        let mut tables = self.lock()?;
        let expense = tables
            .expenses
            .rows
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("Expense", id))?;
        if let Some(description) = patch.description {
            expense.description = description;
        }
        if let Some(category) = patch.category {
            expense.category = category;
        }
        if let Some(amount) = patch.amount {
            expense.amount = money(amount);
        }
        if let Some(date) = patch.date {
            expense.date = date;
        }
        Ok(expense.clone())
    }

    async fn delete_expense(&self, id: i32) -> Result<bool> {
        Ok(self.lock()?.expenses.remove(id))
    }

    async fn create_budget(&self, new: NewBudget) -> Result<budget::Model> {
        let mut tables = self.lock()?;
        tables.budgets.insert_with(|id| budget::Model {
            id,
            category: new.category,
            limit: money(new.limit),
            month: new.month,
        })
    }

    async fn get_budget(&self, id: i32) -> Result<Option<budget::Model>> {
        Ok(self.lock()?.budgets.get(id))
    }

    async fn find_budget(&self, category: &str, month: &str) -> Result<Option<budget::Model>> {
        let tables = self.lock()?;
        Ok(tables
            .budgets
            .rows
            .values()
            .find(|b| b.category == category && b.month == month)
            .cloned())
    }

    async fn list_budgets(&self, month: Option<&str>) -> Result<Vec<budget::Model>> {
        let tables = self.lock()?;
        let mut budgets: Vec<_> = tables
            .budgets
            .rows
            .values()
            .filter(|b| month.is_none_or(|m| b.month == m))
            .cloned()
            .collect();
        budgets.sort_by(|a, b| {
            (a.month.as_str(), a.category.as_str(), a.id)
                .cmp(&(b.month.as_str(), b.category.as_str(), b.id))
        });
        Ok(budgets)
    }

    async fn update_budget_limit(&self, id: i32, limit: Decimal) -> Result<budget::Model> {
        let mut tables = self.lock()?;
        let budget = tables
            .budgets
            .rows
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("Budget", id))?;
        budget.limit = money(limit);
        Ok(budget.clone())
    }

    async fn delete_budget(&self, id: i32) -> Result<bool> {
        Ok(self.lock()?.budgets.remove(id))
    }

    async fn create_recurring_payment(
        &self,
        new: NewRecurringPayment,
    ) -> Result<recurring_payment::Model> {
        let mut tables = self.lock()?;
        tables.recurring_payments.insert_with(|id| recurring_payment::Model {
            id,
            description: new.description,
            category: new.category,
            amount: money(new.amount),
            frequency: new.frequency,
            start_date: new.start_date,
            next_due_date: new.next_due_date,
            is_active: ActiveFlag::from(new.is_active),
            created_at: new.created_at,
        })
    }

    async fn get_recurring_payment(&self, id: i32) -> Result<Option<recurring_payment::Model>> {
        Ok(self.lock()?.recurring_payments.get(id))
    }

    async fn list_recurring_payments(&self) -> Result<Vec<recurring_payment::Model>> {
        Ok(self.lock()?.recurring_payments.rows.values().cloned().collect())
    }

    async fn update_recurring_payment(
        &self,
        id: i32,
        patch: RecurringPaymentPatch,
    ) -> Result<recurring_payment::Model> {
        let mut tables = self.lock()?;
        let payment = tables
            .recurring_payments
            .rows
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("Recurring payment", id))?;
        if let Some(description) = patch.description {
            payment.description = description;
        }
        if let Some(category) = patch.category {
            payment.category = category;
        }
        if let Some(amount) = patch.amount {
            payment.amount = money(amount);
        }
        if let Some(active) = patch.is_active {
            payment.is_active = ActiveFlag::from(active);
        }
        if let Some(next_due_date) = patch.next_due_date {
            payment.next_due_date = next_due_date;
        }
        Ok(payment.clone())
    }

    async fn delete_recurring_payment(&self, id: i32) -> Result<bool> {
        Ok(self.lock()?.recurring_payments.remove(id))
    }

    async fn list_active_recurring_payments_due_by(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<recurring_payment::Model>> {
        let tables = self.lock()?;
        let mut due: Vec<_> = tables
            .recurring_payments
            .rows
            .values()
            .filter(|p| p.is_active() && p.next_due_date <= date)
            .cloned()
            .collect();
        due.sort_by_key(|p| (p.next_due_date, p.id));
        Ok(due)
    }
}
