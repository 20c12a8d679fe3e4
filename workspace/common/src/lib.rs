//! Transport-layer types shared by the HTTP API and the CLI.
//! Amounts travel as decimal strings ("12.99"), dates as `YYYY-MM-DD`.

mod converters;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ===================== Expenses =====================

/// Request body for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 100))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    /// Positive, at most two decimals
    #[schema(value_type = String, example = "12.99")]
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// Request body for changing an expense. Absent fields are kept.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 100))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Validate, PartialEq, Default)]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    /// Only expenses of this category
    pub category: Option<String>,
    /// Only expenses of this month (YYYY-MM)
    #[validate(length(equal = 7))]
    pub month: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExpenseDto {
    pub id: i32,
    pub description: String,
    pub category: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    /// Set when the expense was materialized from a recurring payment
    pub recurring_payment_id: Option<i32>,
    pub occurrence_date: Option<NaiveDate>,
}

// ===================== Budgets =====================

/// Request body for setting the budget of a category in a month.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpsertBudgetRequest {
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    /// YYYY-MM
    #[validate(length(equal = 7))]
    pub month: String,
    #[schema(value_type = String, example = "300.00")]
    pub limit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Validate, PartialEq, Default)]
#[into_params(parameter_in = Query)]
pub struct BudgetQuery {
    /// Only budgets of this month (YYYY-MM)
    #[validate(length(equal = 7))]
    pub month: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Validate, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct BudgetOverviewQuery {
    /// Month to report on (YYYY-MM)
    #[validate(length(equal = 7))]
    pub month: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetDto {
    pub id: i32,
    pub category: String,
    #[schema(value_type = String)]
    pub limit: Decimal,
    pub month: String,
}

/// A budget next to what its category spent that month.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetStatusDto {
    pub budget_id: i32,
    pub category: String,
    pub month: String,
    #[schema(value_type = String)]
    pub limit: Decimal,
    #[schema(value_type = String)]
    pub spent: Decimal,
    /// Negative when overspent
    #[schema(value_type = String)]
    pub remaining: Decimal,
}

// ===================== Recurring payments =====================

/// Request body for registering a recurring payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateRecurringPaymentRequest {
    #[validate(length(min = 1, max = 78))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[schema(value_type = String, example = "12.99")]
    pub amount: Decimal,
    /// weekly, monthly or yearly
    #[schema(example = "monthly")]
    pub frequency: String,
    pub start_date: NaiveDate,
    /// Defaults to true; a paused payment is not reconciled until resumed
    pub is_active: Option<bool>,
}

/// Request body for changing a recurring payment. The schedule cannot change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateRecurringPaymentRequest {
    #[validate(length(min = 1, max = 78))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecurringPaymentDto {
    pub id: i32,
    pub description: String,
    pub category: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub frequency: String,
    pub start_date: NaiveDate,
    /// First occurrence not materialized yet
    pub next_due_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// A registered payment with the expenses its backlog produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecurringPaymentCreatedDto {
    pub payment: RecurringPaymentDto,
    pub created_expenses: Vec<ExpenseDto>,
    /// Present when the backlog could not be filled; the next batch run retries
    pub backlog_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BatchFailureDto {
    pub recurring_payment_id: i32,
    pub error: String,
}

/// Result of one pass over all due recurring payments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BatchSummaryDto {
    pub processed_count: usize,
    pub created_expenses: Vec<ExpenseDto>,
    pub failures: Vec<BatchFailureDto>,
}
