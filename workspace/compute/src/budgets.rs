//! Monthly category budgets and how much of them is spent.

use model::entities::budget;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::error::{LedgerError, Result};
use crate::locks::BudgetLocks;
use crate::month::Month;
use crate::store::{ExpenseFilter, LedgerStore, NewBudget};
use crate::validation;

/// Spending against one budget in its month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget: budget::Model,
    pub spent: Decimal,
    /// Negative once the budget is overspent.
    pub remaining: Decimal,
}

/// Creates the budget for (category, month), or overwrites its limit if one exists.
/// Returns the budget and whether it was newly created.
#[instrument(skip(store, locks, limit))]
pub async fn upsert_budget(
    store: &dyn LedgerStore,
    locks: &BudgetLocks,
    category: &str,
    month: Month,
    limit: Decimal,
) -> Result<(budget::Model, bool)> {
    let category = validation::category(category)?;
    let limit = validation::amount(limit)?;
    let month = month.to_string();

    let _lock = locks.acquire((category.clone(), month.clone())).await?;
    match store.find_budget(&category, &month).await? {
        Some(existing) => {
            let budget = store.update_budget_limit(existing.id, limit).await?;
            info!(budget_id = budget.id, "Updated budget limit");
            Ok((budget, false))
        }
        None => {
            let budget = store
                .create_budget(NewBudget {
                    category,
                    limit,
                    month,
                })
                .await?;
            info!(budget_id = budget.id, "Created budget");
            Ok((budget, true))
        }
    }
}

pub async fn get_budget(store: &dyn LedgerStore, id: i32) -> Result<budget::Model> {
    store
        .get_budget(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Budget", id))
}

pub async fn list_budgets(store: &dyn LedgerStore, month: Option<Month>) -> Result<Vec<budget::Model>> {
    let month = month.map(|m| m.to_string());
    store.list_budgets(month.as_deref()).await
}

#[instrument(skip(store))]
pub async fn delete_budget(store: &dyn LedgerStore, id: i32) -> Result<()> {
    if !store.delete_budget(id).await? {
        return Err(LedgerError::not_found("Budget", id));
    }
    info!("Deleted budget");
    Ok(())
}

/// Every budget of `month` with what its category has spent so far.
#[instrument(skip(store))]
pub async fn budget_overview(store: &dyn LedgerStore, month: Month) -> Result<Vec<BudgetStatus>> {
    let budgets = store.list_budgets(Some(&month.to_string())).await?;
    let mut overview = Vec::with_capacity(budgets.len());

    for budget in budgets {
        let filter = ExpenseFilter::in_month(month).with_category(budget.category.clone());
        let spent: Decimal = store
            .list_expenses(&filter)
            .await?
            .iter()
            .map(|expense| expense.amount)
            .sum();
        let remaining = budget.limit - spent;
        debug!(category = %budget.category, %spent, %remaining, "Budget status");
        overview.push(BudgetStatus {
            budget,
            spent,
            remaining,
        });
    }

    Ok(overview)
}
