//! Exponential-backoff reconnection for the push socket.
//!
//! When the connection to the monitoring server drops, the lifecycle
//! manager calls [`reconnect_loop`] to keep retrying with increasing
//! delays until either the connection is restored or the
//! [`CancellationToken`] is triggered.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::socket::{EventSocketClient, EventSocketConnection};

/// Tunable parameters for the exponential-backoff strategy.
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Attempt to reconnect to the push socket with exponential backoff.
///
/// Retries indefinitely. Returns `Some(connection)` once a connection
/// succeeds, or `None` if the `cancel` token is triggered before one
/// does.
pub async fn reconnect_loop(
    client: &EventSocketClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<EventSocketConnection> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        tracing::info!(
            url = client.ws_url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to push socket",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(url = client.ws_url(), "Reconnect cancelled");
                return None;
            }
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(url = client.ws_url(), attempt, "Reconnected to push socket");
                        return Some(conn);
                    }
                    Err(e) => {
                        tracing::warn!(
                            url = client.ws_url(),
                            error = %e,
                            "Reconnect attempt {attempt} failed",
                        );
                    }
                }
            }
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}
