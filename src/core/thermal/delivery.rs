//! Notification sinks and time-bounded delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::alerts::AlertIntent;

/// A channel capable of delivering an alert (log, webhook, chat script, ...).
///
/// `deliver` may block; the runtime always calls it off the engine task and
/// bounds it with a timeout.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, intent: &AlertIntent) -> anyhow::Result<()>;

    fn describe(&self) -> String {
        "sink".to_string()
    }
}

/// Result of one delivery attempt, fed back to the engine
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub intent: AlertIntent,
    pub result: std::result::Result<(), String>,
    pub completed_at: DateTime<Utc>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Deliver one intent on the blocking pool, treating a timeout as failure.
///
/// A sink that hangs keeps its blocking thread, but the caller gets an answer
/// after `timeout` either way.
pub async fn deliver_with_timeout(
    sink: Arc<dyn NotificationSink>,
    intent: AlertIntent,
    timeout: Duration,
) -> DeliveryOutcome {
    let for_sink = intent.clone();
    let attempt = tokio::task::spawn_blocking(move || sink.deliver(&for_sink));

    let result = match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(format!("{:#}", e)),
        Ok(Err(join_error)) => Err(format!("sink task failed: {}", join_error)),
        Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
    };

    DeliveryOutcome {
        intent,
        result,
        completed_at: Utc::now(),
    }
}
