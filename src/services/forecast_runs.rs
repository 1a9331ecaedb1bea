use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Outcome of a forecast job kickoff.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRunStatus {
    pub success: bool,
    pub message: String,
    pub requested_at: DateTime<Utc>,
}

/// Fire-and-forget kickoff of the external forecasting job. The job's
/// internals (model training, row generation) live entirely upstream;
/// this service only relays the requested timestamp and reports whether
/// the kickoff was accepted.
#[derive(Clone)]
pub struct ForecastRunService {
    http: reqwest::Client,
    job_url: Option<String>,
    timeout: Duration,
    event_sender: Option<Arc<EventSender>>,
}

impl ForecastRunService {
    pub fn new(config: &AppConfig, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            http: reqwest::Client::new(),
            job_url: config.forecast_job_url.clone(),
            timeout: Duration::from_secs(config.forecast_job_timeout_secs),
            event_sender,
        }
    }

    /// Kicks the external job with the given timestamp. No retry here:
    /// retries, if any, belong to the job runner itself.
    #[instrument(skip(self), fields(requested_at = %requested_at))]
    pub async fn trigger(
        &self,
        requested_at: DateTime<Utc>,
    ) -> Result<ForecastRunStatus, ServiceError> {
        let job_url = self.job_url.as_ref().ok_or_else(|| {
            warn!("Forecast run requested but no job endpoint is configured");
            ServiceError::InvalidOperation(
                "forecast job endpoint is not configured".to_string(),
            )
        })?;

        let response = self
            .http
            .post(job_url)
            .timeout(self.timeout)
            .json(&json!({ "timestamp": requested_at.to_rfc3339() }))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Forecast job kickoff request failed");
                ServiceError::ExternalServiceError(format!(
                    "forecast job kickoff failed: {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            error!(status = %response.status(), "Forecast job rejected the kickoff");
            return Err(ServiceError::ExternalServiceError(format!(
                "forecast job returned status {}",
                response.status()
            )));
        }

        info!("Forecast job kickoff accepted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::ForecastRunRequested { requested_at })
                .await
            {
                warn!(error = %e, "Failed to send forecast run requested event");
            }
        }

        Ok(ForecastRunStatus {
            success: true,
            message: "forecast run started".to_string(),
            requested_at,
        })
    }
}
