use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forecast API",
        version = "1.0.0",
        description = r#"
# Customer Order Forecast API

Backend for the customer order-forecast dashboard: joins forecast and
sales records into per-customer bundles, serves dashboard aggregations,
and manages individual forecast records.

## Features

- **Forecast Bundles**: per-customer forecasts plus a gap-filled daily
  actual-sales series, top sellers first
- **Insights**: monthly forecast/actual series, MAPE summary, and
  linear trend for any customer slice
- **Record Management**: edit or delete individual forecast records
- **Forecast Runs**: kick off the external forecasting job

## Error Handling

Failures use a consistent JSON body with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "detail": "Forecast record 42 not found",
  "timestamp": "2025-11-02T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Customer Forecasts", description = "Forecast bundle and record endpoints"),
        (name = "Forecast Runs", description = "Forecasting job kickoff"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::forecasts::list_customer_forecasts,
        crate::handlers::forecasts::update_forecast,
        crate::handlers::forecasts::delete_forecast,
        crate::handlers::insights::get_forecast_insights,
        crate::handlers::forecast_runs::trigger_forecast_run,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Bundle types
            crate::services::aggregation::CustomerForecastBundle,
            crate::services::aggregation::ForecastData,
            crate::services::aggregation::ActualSalesPoint,
            crate::entities::CompanySize,

            // Mutation types
            crate::services::forecasts::UpdateForecastRequest,

            // Insights types
            crate::services::insights::ForecastInsights,
            crate::services::insights::MonthlyPoint,
            crate::services::insights::InsightView,

            // Forecast run types
            crate::handlers::forecast_runs::TriggerForecastRunRequest,
            crate::services::forecast_runs::ForecastRunStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
