use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Router,
};

use crate::{
    errors::ServiceError,
    services::{aggregation::CustomerForecastBundle, forecasts::UpdateForecastRequest},
    AppState,
};

/// Build the customer-forecast Router scoped under `/api/v1/customer-forecasts`.
pub fn customer_forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customer_forecasts))
        .route("/insights", get(super::insights::get_forecast_insights))
        .route(
            "/:cof_id",
            patch(update_forecast).delete(delete_forecast),
        )
}

/// Full dashboard payload: one bundle per forecasted customer, top
/// sellers first. Served as a bare array; the dashboard consumes the
/// rows directly.
#[utoipa::path(
    get,
    path = "/api/v1/customer-forecasts",
    responses(
        (status = 200, description = "Ordered customer forecast bundles", body = Vec<CustomerForecastBundle>),
        (status = 500, description = "Source read failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Customer Forecasts"
)]
pub async fn list_customer_forecasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerForecastBundle>>, ServiceError> {
    let bundles = state.services.forecasts.list_customer_forecasts().await?;
    Ok(Json(bundles))
}

/// Partial edit of one forecast record
#[utoipa::path(
    patch,
    path = "/api/v1/customer-forecasts/{cof_id}",
    params(("cof_id" = i64, Path, description = "Forecast record id")),
    request_body = UpdateForecastRequest,
    responses(
        (status = 204, description = "Forecast record updated"),
        (status = 400, description = "Malformed payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Forecast record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Customer Forecasts"
)]
pub async fn update_forecast(
    State(state): State<AppState>,
    Path(cof_id): Path<i64>,
    Json(request): Json<UpdateForecastRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .forecasts
        .update_forecast(cof_id, request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete one forecast record
#[utoipa::path(
    delete,
    path = "/api/v1/customer-forecasts/{cof_id}",
    params(("cof_id" = i64, Path, description = "Forecast record id")),
    responses(
        (status = 204, description = "Forecast record deleted"),
        (status = 404, description = "Forecast record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Customer Forecasts"
)]
pub async fn delete_forecast(
    State(state): State<AppState>,
    Path(cof_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.forecasts.delete_forecast(cof_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
