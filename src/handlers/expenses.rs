use crate::handlers::parse_month;
use crate::schemas::{error_response, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CreateExpenseRequest, ExpenseDto, ExpenseQuery, UpdateExpenseRequest};
use compute::expenses;
use tracing::{debug, info, instrument, trace};

/// Record a new expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    tag = "expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created successfully", body = ApiResponse<ExpenseDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_expense(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateExpenseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseDto>>), ApiError> {
    trace!("Entering create_expense function");
    debug!("Creating expense '{}' in category '{}' on {}", request.description, request.category, request.date);

    let expense = expenses::create_expense(state.store.as_ref(), request.into(), state.clock.now())
        .await
        .map_err(error_response)?;
    state.invalidate_overviews();

    info!("Expense created successfully with ID: {}", expense.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ExpenseDto::from(expense), "Expense created successfully")),
    ))
}

/// List expenses, optionally filtered by category and month
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    tag = "expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseDto>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expenses(
    Valid(Query(query)): Valid<Query<ExpenseQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseDto>>>, ApiError> {
    trace!("Entering get_expenses function");

    let month = query.month.as_deref().map(parse_month).transpose()?;
    let expenses = expenses::list_expenses(state.store.as_ref(), query.category.as_deref(), month)
        .await
        .map_err(error_response)?;

    debug!("Retrieved {} expenses", expenses.len());
    let data: Vec<ExpenseDto> = expenses.into_iter().map(ExpenseDto::from).collect();
    Ok(Json(ApiResponse::ok(data, "Expenses retrieved successfully")))
}

/// Get a specific expense by ID
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseDto>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpenseDto>>, ApiError> {
    trace!("Entering get_expense function for expense_id: {}", expense_id);

    let expense = expenses::get_expense(state.store.as_ref(), expense_id)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::ok(ExpenseDto::from(expense), "Expense retrieved successfully")))
}

/// Update an expense
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated successfully", body = ApiResponse<ExpenseDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateExpenseRequest>>,
) -> Result<Json<ApiResponse<ExpenseDto>>, ApiError> {
    trace!("Entering update_expense function for expense_id: {}", expense_id);

    let expense = expenses::update_expense(state.store.as_ref(), expense_id, request.into())
        .await
        .map_err(error_response)?;
    state.invalidate_overviews();

    info!("Expense with ID {} updated successfully", expense.id);
    Ok(Json(ApiResponse::ok(ExpenseDto::from(expense), "Expense updated successfully")))
}

/// Delete an expense
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_expense function for expense_id: {}", expense_id);

    expenses::delete_expense(state.store.as_ref(), expense_id)
        .await
        .map_err(error_response)?;
    state.invalidate_overviews();

    info!("Expense with ID {} deleted successfully", expense_id);
    Ok(Json(ApiResponse::ok(
        format!("Expense {} deleted", expense_id),
        "Expense deleted successfully",
    )))
}
