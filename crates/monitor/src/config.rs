use std::time::Duration;

/// Monitor configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Push socket endpoint (default: `ws://localhost:4000`).
    pub socket_url: String,
    /// Backend base URL for the REST event store (default:
    /// `http://localhost:4000`).
    pub backend_url: String,
    /// Recency window for the freshness filter, in seconds (default: `60`).
    pub freshness_window_secs: u64,
    /// Snapshot store poll interval, in seconds (default: `5`).
    pub snapshot_poll_secs: u64,
    /// Number of most-recent records per snapshot query (default: `20`).
    pub snapshot_limit: usize,
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `SOCKET_URL`            | `ws://localhost:4000`   |
    /// | `BACKEND_URL`           | `http://localhost:4000` |
    /// | `FRESHNESS_WINDOW_SECS` | `60`                    |
    /// | `SNAPSHOT_POLL_SECS`    | `5`                     |
    /// | `SNAPSHOT_LIMIT`        | `20`                    |
    pub fn from_env() -> Self {
        let socket_url =
            std::env::var("SOCKET_URL").unwrap_or_else(|_| "ws://localhost:4000".into());

        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:4000".into());

        let freshness_window_secs: u64 = std::env::var("FRESHNESS_WINDOW_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("FRESHNESS_WINDOW_SECS must be a valid u64");

        let snapshot_poll_secs: u64 = std::env::var("SNAPSHOT_POLL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("SNAPSHOT_POLL_SECS must be a valid u64");

        let snapshot_limit: usize = std::env::var("SNAPSHOT_LIMIT")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("SNAPSHOT_LIMIT must be a valid usize");

        Self {
            socket_url,
            backend_url,
            freshness_window_secs,
            snapshot_poll_secs,
            snapshot_limit,
        }
    }

    /// Recency window as a [`Duration`].
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Snapshot poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_poll_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            socket_url: "ws://localhost:4000".into(),
            backend_url: "http://localhost:4000".into(),
            freshness_window_secs: 60,
            snapshot_poll_secs: 5,
            snapshot_limit: 20,
        }
    }
}
