//! Conversions between the transport types and the model / compute types.

use compute::batch::{BatchFailure, BatchSummary};
use compute::budgets::BudgetStatus;
use compute::expenses::{ExpenseDraft, ExpenseUpdate};
use compute::recurring::{Registration, RecurringPaymentDraft, RecurringPaymentUpdate};
use model::entities::{budget, expense, recurring_payment};

use crate::{
    BatchFailureDto, BatchSummaryDto, BudgetDto, BudgetStatusDto, CreateExpenseRequest,
    CreateRecurringPaymentRequest, ExpenseDto, RecurringPaymentCreatedDto, RecurringPaymentDto,
    UpdateExpenseRequest, UpdateRecurringPaymentRequest,
};

impl From<expense::Model> for ExpenseDto {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            category: model.category,
            amount: model.amount,
            date: model.date,
            created_at: model.created_at,
            recurring_payment_id: model.recurring_payment_id,
            occurrence_date: model.occurrence_date,
        }
    }
}

impl From<CreateExpenseRequest> for ExpenseDraft {
    fn from(request: CreateExpenseRequest) -> Self {
        Self {
            description: request.description,
            category: request.category,
            amount: request.amount,
            date: request.date,
        }
    }
}

impl From<UpdateExpenseRequest> for ExpenseUpdate {
    fn from(request: UpdateExpenseRequest) -> Self {
        Self {
            description: request.description,
            category: request.category,
            amount: request.amount,
            date: request.date,
        }
    }
}

impl From<budget::Model> for BudgetDto {
    fn from(model: budget::Model) -> Self {
        Self {
            id: model.id,
            category: model.category,
            limit: model.limit,
            month: model.month,
        }
    }
}

impl From<BudgetStatus> for BudgetStatusDto {
    fn from(status: BudgetStatus) -> Self {
        Self {
            budget_id: status.budget.id,
            category: status.budget.category,
            month: status.budget.month,
            limit: status.budget.limit,
            spent: status.spent,
            remaining: status.remaining,
        }
    }
}

impl From<recurring_payment::Model> for RecurringPaymentDto {
    fn from(model: recurring_payment::Model) -> Self {
        Self {
            id: model.id,
            is_active: model.is_active(),
            description: model.description,
            category: model.category,
            amount: model.amount,
            frequency: model.frequency.to_string(),
            start_date: model.start_date,
            next_due_date: model.next_due_date,
            created_at: model.created_at,
        }
    }
}

impl From<CreateRecurringPaymentRequest> for RecurringPaymentDraft {
    fn from(request: CreateRecurringPaymentRequest) -> Self {
        Self {
            description: request.description,
            category: request.category,
            amount: request.amount,
            frequency: request.frequency,
            start_date: request.start_date,
            is_active: request.is_active.unwrap_or(true),
        }
    }
}

impl From<UpdateRecurringPaymentRequest> for RecurringPaymentUpdate {
    fn from(request: UpdateRecurringPaymentRequest) -> Self {
        Self {
            description: request.description,
            category: request.category,
            amount: request.amount,
            is_active: request.is_active,
        }
    }
}

impl From<Registration> for RecurringPaymentCreatedDto {
    fn from(registration: Registration) -> Self {
        Self {
            payment: registration.payment.into(),
            created_expenses: registration.created.into_iter().map(ExpenseDto::from).collect(),
            backlog_error: registration.backlog_error,
        }
    }
}

impl From<BatchFailure> for BatchFailureDto {
    fn from(failure: BatchFailure) -> Self {
        Self {
            recurring_payment_id: failure.recurring_payment_id,
            error: failure.error,
        }
    }
}

impl From<BatchSummary> for BatchSummaryDto {
    fn from(summary: BatchSummary) -> Self {
        Self {
            processed_count: summary.processed_count,
            created_expenses: summary
                .created_expenses
                .into_iter()
                .map(ExpenseDto::from)
                .collect(),
            failures: summary.failures.into_iter().map(BatchFailureDto::from).collect(),
        }
    }
}
