use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    entities::CompanySize,
    errors::ServiceError,
    services::insights::{ForecastInsights, InsightSelection, InsightView},
    ApiResponse, AppState,
};

/// Query parameters for the insights endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct InsightsQuery {
    /// View selection: all customers, one size cohort, or one customer
    #[serde(default)]
    pub view: InsightView,
    /// Company-size cohort, required when `view=size`
    pub size: Option<CompanySize>,
    /// Customer id, required when `view=customer`
    pub customer_id: Option<i64>,
    /// Inclusive month-range start (any day within the month)
    pub from: Option<NaiveDate>,
    /// Inclusive month-range end
    pub to: Option<NaiveDate>,
}

/// Dashboard aggregation: monthly forecast/actual series plus summary stats
#[utoipa::path(
    get,
    path = "/api/v1/customer-forecasts/insights",
    params(InsightsQuery),
    responses(
        (status = 200, description = "Forecast insights computed", body = ApiResponse<ForecastInsights>),
        (status = 400, description = "Invalid view selection", body = crate::errors::ErrorResponse)
    ),
    tag = "Customer Forecasts"
)]
pub async fn get_forecast_insights(
    State(state): State<AppState>,
    Query(params): Query<InsightsQuery>,
) -> Result<Json<ApiResponse<ForecastInsights>>, ServiceError> {
    let selection = InsightSelection {
        view: params.view,
        size: params.size,
        customer_id: params.customer_id,
        from: params.from,
        to: params.to,
    };

    let insights = state
        .services
        .insights
        .customer_forecast_insights(selection)
        .await?;

    Ok(Json(ApiResponse::success(insights)))
}
