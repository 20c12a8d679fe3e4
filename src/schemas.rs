use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, response::Json};
use common::{
    BatchFailureDto, BatchSummaryDto, BudgetDto, BudgetStatusDto, CreateExpenseRequest,
    CreateRecurringPaymentRequest, ExpenseDto, RecurringPaymentCreatedDto, RecurringPaymentDto,
    UpdateExpenseRequest, UpdateRecurringPaymentRequest, UpsertBudgetRequest,
};
use compute::{BudgetLocks, Clock, LedgerError, LedgerStore, Reconciler};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Ledger storage, memory or database backed
    pub store: Arc<dyn LedgerStore>,
    /// Source of "now" for new records and reconciliation
    pub clock: Arc<dyn Clock>,
    pub reconciler: Arc<Reconciler>,
    /// Serializes budget upserts per (category, month)
    pub budget_locks: Arc<BudgetLocks>,
    /// Budget overviews by month (YYYY-MM)
    pub cache: Cache<String, Vec<BudgetStatusDto>>,
    /// Bumped by every write that can change an overview
    overview_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            reconciler: Arc::new(Reconciler::new(store.clone())),
            budget_locks: Arc::new(BudgetLocks::default()),
            store,
            clock,
            cache,
            overview_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Drops every cached overview. Called after any write that can change spending.
    pub fn invalidate_overviews(&self) {
        self.overview_generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }

    /// Read before computing an overview, then hand to [`AppState::cache_overview`].
    pub fn overview_generation(&self) -> u64 {
        self.overview_generation.load(Ordering::SeqCst)
    }

    /// Caches `overview` unless a write happened since `generation` was read.
    pub async fn cache_overview(&self, month: String, overview: Vec<BudgetStatusDto>, generation: u64) {
        self.cache.insert(month.clone(), overview).await;
        if self.overview_generation() != generation {
            debug!("Overview for {} went stale while computing, dropping it", month);
            self.cache.invalidate(&month).await;
        }
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a ledger error onto its HTTP status and error code.
pub fn error_response(err: LedgerError) -> ApiError {
    let (status, code) = match &err {
        LedgerError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        LedgerError::Database(_) | LedgerError::Store(_) | LedgerError::Date(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
        }
    };

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Store connection status
    pub store: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::budgets::upsert_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::budgets::get_budget_overview,
        crate::handlers::recurring_payments::create_recurring_payment,
        crate::handlers::recurring_payments::get_recurring_payments,
        crate::handlers::recurring_payments::get_recurring_payment,
        crate::handlers::recurring_payments::update_recurring_payment,
        crate::handlers::recurring_payments::delete_recurring_payment,
        crate::handlers::recurring_payments::process_recurring_payments,
    ),
    components(
        schemas(
            ApiResponse<ExpenseDto>,
            ApiResponse<Vec<ExpenseDto>>,
            ApiResponse<BudgetDto>,
            ApiResponse<Vec<BudgetDto>>,
            ApiResponse<Vec<BudgetStatusDto>>,
            ApiResponse<RecurringPaymentDto>,
            ApiResponse<Vec<RecurringPaymentDto>>,
            ApiResponse<RecurringPaymentCreatedDto>,
            ApiResponse<BatchSummaryDto>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            CreateExpenseRequest,
            UpdateExpenseRequest,
            ExpenseDto,
            UpsertBudgetRequest,
            BudgetDto,
            BudgetStatusDto,
            CreateRecurringPaymentRequest,
            UpdateRecurringPaymentRequest,
            RecurringPaymentDto,
            RecurringPaymentCreatedDto,
            BatchSummaryDto,
            BatchFailureDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "expenses", description = "Expense endpoints"),
        (name = "budgets", description = "Monthly budget endpoints"),
        (name = "recurring-payments", description = "Recurring payment endpoints"),
    ),
    info(
        title = "Spendwise API",
        description = "Personal expense tracker with budgets and recurring payments",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
