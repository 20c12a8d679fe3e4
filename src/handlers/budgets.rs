use crate::handlers::parse_month;
use crate::schemas::{error_response, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{BudgetDto, BudgetOverviewQuery, BudgetQuery, BudgetStatusDto, UpsertBudgetRequest};
use compute::budgets;
use tracing::{debug, info, instrument, trace};

/// Set the budget of a category for a month
///
/// Creates the budget when none exists for (category, month), otherwise
/// overwrites its limit.
#[utoipa::path(
    put,
    path = "/api/v1/budgets",
    tag = "budgets",
    request_body = UpsertBudgetRequest,
    responses(
        (status = 201, description = "Budget created", body = ApiResponse<BudgetDto>),
        (status = 200, description = "Budget limit updated", body = ApiResponse<BudgetDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn upsert_budget(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpsertBudgetRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    trace!("Entering upsert_budget function");
    let month = parse_month(&request.month)?;

    let (budget, created) = budgets::upsert_budget(
        state.store.as_ref(),
        &state.budget_locks,
        &request.category,
        month,
        request.limit,
    )
    .await
    .map_err(error_response)?;
    state.invalidate_overviews();

    let (status, message) = if created {
        (StatusCode::CREATED, "Budget created successfully")
    } else {
        (StatusCode::OK, "Budget updated successfully")
    };
    info!("{} (ID: {}, category: {}, month: {})", message, budget.id, budget.category, budget.month);
    Ok((status, Json(ApiResponse::ok(BudgetDto::from(budget), message))))
}

/// List budgets, optionally for one month
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    params(BudgetQuery),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetDto>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    Valid(Query(query)): Valid<Query<BudgetQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BudgetDto>>>, ApiError> {
    trace!("Entering get_budgets function");
    let month = query.month.as_deref().map(parse_month).transpose()?;

    let budgets = budgets::list_budgets(state.store.as_ref(), month)
        .await
        .map_err(error_response)?;

    debug!("Retrieved {} budgets", budgets.len());
    let data: Vec<BudgetDto> = budgets.into_iter().map(BudgetDto::from).collect();
    Ok(Json(ApiResponse::ok(data, "Budgets retrieved successfully")))
}

/// Get a specific budget by ID
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = ApiResponse<BudgetDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BudgetDto>>, ApiError> {
    let budget = budgets::get_budget(state.store.as_ref(), budget_id)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::ok(BudgetDto::from(budget), "Budget retrieved successfully")))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    budgets::delete_budget(state.store.as_ref(), budget_id)
        .await
        .map_err(error_response)?;
    state.invalidate_overviews();

    info!("Budget with ID {} deleted successfully", budget_id);
    Ok(Json(ApiResponse::ok(
        format!("Budget {} deleted", budget_id),
        "Budget deleted successfully",
    )))
}

/// Spending against every budget of a month
#[utoipa::path(
    get,
    path = "/api/v1/budgets/overview",
    tag = "budgets",
    params(BudgetOverviewQuery),
    responses(
        (status = 200, description = "Budget overview computed", body = ApiResponse<Vec<BudgetStatusDto>>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_overview(
    Valid(Query(query)): Valid<Query<BudgetOverviewQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BudgetStatusDto>>>, ApiError> {
    trace!("Entering get_budget_overview function");
    let month = parse_month(&query.month)?;
    let cache_key = month.to_string();

    if let Some(cached) = state.cache.get(&cache_key).await {
        debug!("Returning cached budget overview for {}", cache_key);
        return Ok(Json(ApiResponse::ok(cached, "Budget overview retrieved from cache")));
    }

    let generation = state.overview_generation();
    let overview: Vec<BudgetStatusDto> = budgets::budget_overview(state.store.as_ref(), month)
        .await
        .map_err(error_response)?
        .into_iter()
        .map(BudgetStatusDto::from)
        .collect();
    state.cache_overview(cache_key, overview.clone(), generation).await;

    info!("Computed budget overview with {} budgets", overview.len());
    Ok(Json(ApiResponse::ok(overview, "Budget overview computed successfully")))
}
