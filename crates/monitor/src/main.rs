use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homepal_core::NotificationPayload;
use homepal_monitor::{MonitorConfig, MonitorContext};
use homepal_transport::RestEventStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homepal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = MonitorConfig::from_env();
    tracing::info!(
        socket_url = %config.socket_url,
        backend_url = %config.backend_url,
        freshness_window_secs = config.freshness_window_secs,
        "Loaded monitor configuration"
    );

    // --- Context ---
    // Headless: no native notification capability, in-app surface only.
    let context = MonitorContext::new(config, None);

    // In-app surface: log every dispatched notification.
    context.register_event_callback(Arc::new(|payload: &NotificationPayload| {
        tracing::info!(
            title = %payload.title,
            body = %payload.body,
            event_id = payload.event_id.as_deref().unwrap_or("<none>"),
            "In-app notification"
        );
    }));

    // --- Snapshot channel over the backend REST store ---
    let store = Arc::new(RestEventStore::new(context.config().backend_url.clone())?);
    let _snapshot_subscription = context.subscribe_to_events(store);
    tracing::info!("Snapshot listener started");

    // --- Push channel ---
    if !context.connect_socket() {
        tracing::warn!("Push socket not initiated, relying on snapshot polling only");
    }

    // --- Connectivity indicator ---
    let status_context = Arc::clone(&context);
    let status_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            tracing::debug!(state = ?status_context.connection_state(), "Connectivity");
        }
    });

    // --- Shutdown ---
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    status_task.abort();
    context.shutdown();

    Ok(())
}
