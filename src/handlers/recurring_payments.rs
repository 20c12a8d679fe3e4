use crate::schemas::{error_response, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{
    BatchSummaryDto, CreateRecurringPaymentRequest, RecurringPaymentCreatedDto,
    RecurringPaymentDto, UpdateRecurringPaymentRequest,
};
use compute::{process_all, recurring};
use tracing::{debug, info, instrument, trace, warn};

/// Register a recurring payment
///
/// Every occurrence from the start date up to today is materialized as an
/// expense right away, unless the payment is created paused.
#[utoipa::path(
    post,
    path = "/api/v1/recurring-payments",
    tag = "recurring-payments",
    request_body = CreateRecurringPaymentRequest,
    responses(
        (status = 201, description = "Recurring payment registered", body = ApiResponse<RecurringPaymentCreatedDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_recurring_payment(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateRecurringPaymentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPaymentCreatedDto>>), ApiError> {
    trace!("Entering create_recurring_payment function");
    debug!("Registering recurring payment '{}' ({}) from {}", request.description, request.frequency, request.start_date);

    let registration = recurring::register_recurring_payment(&state.reconciler, request.into(), state.clock.now())
        .await
        .map_err(error_response)?;
    if !registration.created.is_empty() {
        state.invalidate_overviews();
    }
    if let Some(backlog_error) = &registration.backlog_error {
        warn!("Recurring payment {} stored without its backlog: {}", registration.payment.id, backlog_error);
    }

    info!(
        "Recurring payment created successfully with ID: {}, {} expenses materialized",
        registration.payment.id,
        registration.created.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RecurringPaymentCreatedDto::from(registration),
            "Recurring payment created successfully",
        )),
    ))
}

/// List all recurring payments
#[utoipa::path(
    get,
    path = "/api/v1/recurring-payments",
    tag = "recurring-payments",
    responses(
        (status = 200, description = "Recurring payments retrieved successfully", body = ApiResponse<Vec<RecurringPaymentDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_recurring_payments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RecurringPaymentDto>>>, ApiError> {
    let payments = recurring::list_recurring_payments(state.store.as_ref())
        .await
        .map_err(error_response)?;

    debug!("Retrieved {} recurring payments", payments.len());
    let data: Vec<RecurringPaymentDto> = payments.into_iter().map(RecurringPaymentDto::from).collect();
    Ok(Json(ApiResponse::ok(data, "Recurring payments retrieved successfully")))
}

/// Get a specific recurring payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/recurring-payments/{payment_id}",
    tag = "recurring-payments",
    params(
        ("payment_id" = i32, Path, description = "Recurring payment ID"),
    ),
    responses(
        (status = 200, description = "Recurring payment retrieved successfully", body = ApiResponse<RecurringPaymentDto>),
        (status = 404, description = "Recurring payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_recurring_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RecurringPaymentDto>>, ApiError> {
    let payment = recurring::get_recurring_payment(state.store.as_ref(), payment_id)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::ok(
        RecurringPaymentDto::from(payment),
        "Recurring payment retrieved successfully",
    )))
}

/// Update a recurring payment
///
/// Description, category, amount and the active flag can change; the
/// schedule cannot. A resumed payment catches up on the next processing run.
#[utoipa::path(
    put,
    path = "/api/v1/recurring-payments/{payment_id}",
    tag = "recurring-payments",
    params(
        ("payment_id" = i32, Path, description = "Recurring payment ID"),
    ),
    request_body = UpdateRecurringPaymentRequest,
    responses(
        (status = 200, description = "Recurring payment updated successfully", body = ApiResponse<RecurringPaymentDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recurring payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_recurring_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateRecurringPaymentRequest>>,
) -> Result<Json<ApiResponse<RecurringPaymentDto>>, ApiError> {
    let payment = recurring::update_recurring_payment(state.store.as_ref(), payment_id, request.into())
        .await
        .map_err(error_response)?;

    info!("Recurring payment with ID {} updated successfully", payment.id);
    Ok(Json(ApiResponse::ok(
        RecurringPaymentDto::from(payment),
        "Recurring payment updated successfully",
    )))
}

/// Delete a recurring payment
///
/// Expenses already materialized from it are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/recurring-payments/{payment_id}",
    tag = "recurring-payments",
    params(
        ("payment_id" = i32, Path, description = "Recurring payment ID"),
    ),
    responses(
        (status = 200, description = "Recurring payment deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Recurring payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_recurring_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    recurring::delete_recurring_payment(&state.reconciler, payment_id)
        .await
        .map_err(error_response)?;

    info!("Recurring payment with ID {} deleted successfully", payment_id);
    Ok(Json(ApiResponse::ok(
        format!("Recurring payment {} deleted", payment_id),
        "Recurring payment deleted successfully",
    )))
}

/// Materialize every due recurring payment now
#[utoipa::path(
    post,
    path = "/api/v1/recurring-payments/process",
    tag = "recurring-payments",
    responses(
        (status = 200, description = "Due recurring payments processed", body = ApiResponse<BatchSummaryDto>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn process_recurring_payments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BatchSummaryDto>>, ApiError> {
    trace!("Entering process_recurring_payments function");

    let summary = process_all(&state.reconciler, state.clock.now())
        .await
        .map_err(error_response)?;
    if !summary.created_expenses.is_empty() {
        state.invalidate_overviews();
    }

    info!(
        "Processed {} recurring payments, {} expenses created, {} failures",
        summary.processed_count,
        summary.created_expenses.len(),
        summary.failures.len()
    );
    Ok(Json(ApiResponse::ok(
        BatchSummaryDto::from(summary),
        "Recurring payments processed successfully",
    )))
}
