//! WebSocket client for the push channel.
//!
//! [`EventSocketClient`] holds the connection configuration for the
//! monitoring server's push socket. Call
//! [`EventSocketClient::connect`] to establish a live
//! [`EventSocketConnection`], then feed its stream to
//! [`process_messages`].

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};
use tokio_util::sync::CancellationToken;

use crate::messages::{parse_message, ServerMessage};
use crate::stream::{RecordOrigin, TransportEvent};

/// The raw WebSocket stream type used by the push channel.
pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Errors from the socket client.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Failed to establish the WebSocket connection.
    #[error("connection error: {0}")]
    Connection(String),
}

/// Configuration handle for the push socket.
pub struct EventSocketClient {
    ws_url: String,
}

/// A live WebSocket connection to the monitoring server.
pub struct EventSocketConnection {
    /// Unique client ID sent during the handshake.
    pub client_id: String,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: WsStream,
}

impl EventSocketClient {
    /// Create a client targeting the push socket endpoint.
    ///
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:4000`.
    pub fn new(ws_url: String) -> Self {
        Self { ws_url }
    }

    /// WebSocket base URL.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the push socket.
    ///
    /// Generates a unique `clientId` (UUID v4) and appends it as a query
    /// parameter so the server can address messages back to this client.
    pub async fn connect(&self) -> Result<EventSocketConnection, SocketError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/ws?clientId={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            SocketError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        tracing::info!(client_id = %client_id, "Connected to push socket at {}", self.ws_url);

        Ok(EventSocketConnection {
            client_id,
            ws_stream,
        })
    }
}

/// Process frames from a live push-socket connection.
///
/// Loops until the socket closes, a fatal receive error occurs, or
/// `cancel` is triggered. Every record arriving here is live by
/// construction, so it is forwarded as [`RecordOrigin::LiveAdd`]; no
/// initial-snapshot distinction applies to the push channel. A frame
/// arriving concurrently with cancellation is dropped, not forwarded.
pub async fn process_messages(
    ws_stream: &mut WsStream,
    events: &broadcast::Sender<TransportEvent>,
    cancel: &CancellationToken,
) {
    loop {
        let msg_result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Push socket processing cancelled");
                return;
            }
            next = ws_stream.next() => match next {
                Some(result) => result,
                None => return, // stream exhausted
            },
        };

        match msg_result {
            Ok(Message::Text(text)) => {
                handle_text_message(&text, events);
            }
            Ok(Message::Binary(_)) => {
                tracing::trace!("Ignoring binary frame");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Push socket closed by server");
                return;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                tracing::error!(error = %e, "Push socket receive error");
                return;
            }
        }
    }
}

/// Parse one text frame and forward it onto the stream.
fn handle_text_message(text: &str, events: &broadcast::Sender<TransportEvent>) {
    match parse_message(text) {
        Ok(ServerMessage::Event(event)) => {
            tracing::debug!(event_id = %event.id, "Live record received on push socket");
            let _ = events.send(TransportEvent::Record {
                event,
                origin: RecordOrigin::LiveAdd,
            });
        }
        Ok(ServerMessage::Notification(notification)) => {
            tracing::debug!("Server notification received on push socket");
            let _ = events.send(TransportEvent::Notification(notification));
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_message = %text,
                "Failed to parse push socket message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn event_frame_is_forwarded_as_live_record() {
        let (tx, mut rx) = broadcast::channel(16);
        handle_text_message(
            r#"{"type":"event","data":{"id":"e1","action":"Bed-Exit","time":"2026-08-07T10:00:00Z"}}"#,
            &tx,
        );

        let item = rx.try_recv().unwrap();
        assert_matches!(
            item,
            TransportEvent::Record {
                origin: RecordOrigin::LiveAdd,
                ..
            }
        );
    }

    #[test]
    fn notification_frame_is_forwarded() {
        let (tx, mut rx) = broadcast::channel(16);
        handle_text_message(
            r#"{"type":"notification","data":{"title":"HomePal Alert","body":"New event: Bed-Exit"}}"#,
            &tx,
        );

        let item = rx.try_recv().unwrap();
        assert_matches!(item, TransportEvent::Notification(_));
    }

    #[test]
    fn unparseable_frame_is_dropped() {
        let (tx, mut rx) = broadcast::channel(16);
        handle_text_message("garbage", &tx);
        handle_text_message(r#"{"type":"telemetry","data":{}}"#, &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forwarding_without_receivers_does_not_panic() {
        let (tx, _) = broadcast::channel(16);
        handle_text_message(
            r#"{"type":"event","data":{"id":"e1","time":"2026-08-07T10:00:00Z"}}"#,
            &tx,
        );
    }
}
