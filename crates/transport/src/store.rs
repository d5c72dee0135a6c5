//! REST-backed event store.
//!
//! [`RestEventStore`] implements [`EventStore`] over the backend's HTTP
//! API using [`reqwest`]. It is the store the UI already polls when
//! real-time connectivity is lost, reused here as the snapshot channel's
//! query interface.

use std::time::Duration;

use async_trait::async_trait;

use homepal_core::RawEvent;

use crate::snapshot::{EventStore, StoreError};

/// HTTP request timeout for a single query.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the backend event store.
pub struct RestEventStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestEventStore {
    /// Create a store client for a backend base URL, e.g.
    /// `http://host:4000`.
    pub fn new(base_url: String) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Create a store client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across components).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EventStore for RestEventStore {
    /// Query the most recent records, ordered by time descending.
    ///
    /// Sends `GET /api/events?limit=N` and decodes the JSON array of
    /// records.
    async fn recent_events(&self, limit: usize) -> Result<Vec<RawEvent>, StoreError> {
        let url = format!("{}/api/events?limit={limit}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<RawEvent>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_builds_a_client() {
        let store = RestEventStore::new("http://localhost:4000".into()).unwrap();
        assert_eq!(store.base_url(), "http://localhost:4000");
    }

    #[test]
    fn with_client_reuses_the_pool() {
        let client = reqwest::Client::new();
        let store = RestEventStore::with_client(client, "http://localhost:4000".into());
        assert_eq!(store.base_url(), "http://localhost:4000");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "store returned HTTP 503: unavailable");
    }
}
