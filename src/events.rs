use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Forecast record events
    ForecastUpdated(i64),
    ForecastDeleted(i64),

    // Forecast job events
    ForecastRunRequested { requested_at: DateTime<Utc> },
}

/// Drains the event channel and logs each event. Runs for the lifetime
/// of the process; exits when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ForecastUpdated(cof_id) => {
                info!(cof_id = cof_id, "Forecast record updated");
            }
            Event::ForecastDeleted(cof_id) => {
                info!(cof_id = cof_id, "Forecast record deleted");
            }
            Event::ForecastRunRequested { requested_at } => {
                info!(requested_at = %requested_at, "Forecast run requested");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender.send(Event::ForecastUpdated(7)).await.unwrap();
        sender.send(Event::ForecastDeleted(7)).await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::ForecastUpdated(7))));
        assert!(matches!(rx.recv().await, Some(Event::ForecastDeleted(7))));
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::ForecastDeleted(1)).await.is_err());
    }
}
