use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError, services::forecast_runs::ForecastRunStatus, AppState,
};

/// Build the forecast-run Router scoped under `/api/v1/forecast-runs`.
pub fn forecast_run_routes() -> Router<AppState> {
    Router::new().route("/", post(trigger_forecast_run))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerForecastRunRequest {
    /// Timestamp relayed to the forecasting job; defaults to "now"
    pub timestamp: Option<DateTime<Utc>>,
}

/// Fire-and-forget kickoff of the external forecasting job
#[utoipa::path(
    post,
    path = "/api/v1/forecast-runs",
    request_body = TriggerForecastRunRequest,
    responses(
        (status = 200, description = "Forecast run started", body = ForecastRunStatus),
        (status = 400, description = "Trigger endpoint not configured", body = crate::errors::ErrorResponse),
        (status = 502, description = "Forecasting job rejected the kickoff", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecast Runs"
)]
pub async fn trigger_forecast_run(
    State(state): State<AppState>,
    Json(request): Json<TriggerForecastRunRequest>,
) -> Result<Json<ForecastRunStatus>, ServiceError> {
    let requested_at = request.timestamp.unwrap_or_else(Utc::now);
    let status = state.services.forecast_runs.trigger(requested_at).await?;
    Ok(Json(status))
}
