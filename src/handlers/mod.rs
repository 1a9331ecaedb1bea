pub mod forecast_runs;
pub mod forecasts;
pub mod insights;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub forecasts: Arc<crate::services::forecasts::CustomerForecastService>,
    pub insights: Arc<crate::services::insights::ForecastInsightsService>,
    pub forecast_runs: Arc<crate::services::forecast_runs::ForecastRunService>,
}

impl AppServices {
    /// Build the AppServices container shared by all HTTP handlers.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let forecasts = Arc::new(crate::services::forecasts::CustomerForecastService::new(
            db_pool,
            Some(event_sender.clone()),
        ));
        let insights = Arc::new(crate::services::insights::ForecastInsightsService::new(
            forecasts.clone(),
        ));
        let forecast_runs = Arc::new(crate::services::forecast_runs::ForecastRunService::new(
            config,
            Some(event_sender),
        ));

        Self {
            forecasts,
            insights,
            forecast_runs,
        }
    }
}
