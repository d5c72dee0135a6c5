//! Snapshot-subscription channel over a queryable event store.
//!
//! [`SnapshotListener`] adapts a most-recent-N query interface into the
//! unified record stream: the first successful query is the **initial
//! snapshot** (historical backfill, labeled
//! [`RecordOrigin::InitialSnapshot`]); records appearing in later polls
//! that were not seen before are live additions
//! ([`RecordOrigin::LiveAdd`]). Records are deduplicated by `id`, so
//! reordered or re-delivered rows surface at most once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use homepal_core::RawEvent;

use crate::stream::RecordOrigin;
use crate::subscription::Subscription;

/// Errors from an event store query.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request itself failed (network, DNS, timeout).
    #[error("store request failed: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("store returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// The response body did not decode into event records.
    #[error("malformed store response: {0}")]
    Decode(String),
}

/// A queryable event store: most-recent-N records ordered by time
/// descending.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn recent_events(&self, limit: usize) -> Result<Vec<RawEvent>, StoreError>;
}

/// Polls an [`EventStore`] and reports incremental additions.
pub struct SnapshotListener<S> {
    store: Arc<S>,
    limit: usize,
    poll_interval: Duration,
}

impl<S: EventStore + 'static> SnapshotListener<S> {
    /// Create a listener querying the `limit` most recent records every
    /// `poll_interval`.
    pub fn new(store: Arc<S>, limit: usize, poll_interval: Duration) -> Self {
        Self {
            store,
            limit,
            poll_interval,
        }
    }

    /// Start listening. Never fails: store errors are logged and retried
    /// at the next poll tick, not surfaced to the caller, since the
    /// caller is typically inside a UI lifecycle hook that cannot recover
    /// from a synchronous failure.
    ///
    /// `on_record` receives every record exactly once, labeled with its
    /// origin. No invocation happens after the returned
    /// [`Subscription`] is torn down.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, on_record: F) -> Subscription
    where
        F: Fn(RawEvent, RecordOrigin) + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let store = Arc::clone(&self.store);
        let limit = self.limit;
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            run_poll_loop(store, limit, poll_interval, on_record, task_cancel).await;
        });

        Subscription::new(cancel, task)
    }
}

/// Poll-and-diff loop. The first tick fires immediately, so the initial
/// snapshot is delivered without waiting a full interval.
async fn run_poll_loop<S, F>(
    store: Arc<S>,
    limit: usize,
    poll_interval: Duration,
    on_record: F,
    cancel: CancellationToken,
) where
    S: EventStore,
    F: Fn(RawEvent, RecordOrigin) + Send + Sync,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut initial_done = false;
    let mut interval = tokio::time::interval(poll_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Snapshot listener cancelled");
                return;
            }
            _ = interval.tick() => {}
        }

        let batch = match store.recent_events(limit).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "Event store query failed, will retry");
                continue;
            }
        };

        let origin = if initial_done {
            RecordOrigin::LiveAdd
        } else {
            RecordOrigin::InitialSnapshot
        };

        for event in batch {
            if !seen.insert(event.id.clone()) {
                continue; // already reported
            }
            // A record observed concurrently with teardown is dropped.
            if cancel.is_cancelled() {
                return;
            }
            tracing::trace!(event_id = %event.id, ?origin, "Snapshot listener record");
            on_record(event, origin);
        }

        // Only a successful query completes the initial snapshot.
        initial_done = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use homepal_core::EventTime;
    use std::sync::Mutex;

    /// Store serving a scripted sequence of query results.
    struct ScriptedStore {
        batches: Mutex<Vec<Result<Vec<RawEvent>, StoreError>>>,
    }

    impl ScriptedStore {
        fn new(batches: Vec<Result<Vec<RawEvent>, StoreError>>) -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(batches),
            })
        }
    }

    #[async_trait]
    impl EventStore for ScriptedStore {
        async fn recent_events(&self, _limit: usize) -> Result<Vec<RawEvent>, StoreError> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                return Ok(Vec::new());
            }
            batches.remove(0)
        }
    }

    fn event(id: &str) -> RawEvent {
        RawEvent {
            id: id.into(),
            action: Some("Bed-Exit".into()),
            time: EventTime::Iso("2026-08-07T10:00:00Z".into()),
            is_handled: false,
            device_id: None,
            patient_id: None,
            description: None,
        }
    }

    fn recording_sink() -> (
        Arc<Mutex<Vec<(String, RecordOrigin)>>>,
        impl Fn(RawEvent, RecordOrigin) + Send + Sync + 'static,
    ) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        let on_record = move |e: RawEvent, origin: RecordOrigin| {
            sink.lock().unwrap().push((e.id, origin));
        };
        (records, on_record)
    }

    #[tokio::test]
    async fn first_batch_is_initial_snapshot_later_ids_are_live() {
        let store = ScriptedStore::new(vec![
            Ok(vec![event("e1"), event("e2")]),
            Ok(vec![event("e3"), event("e1"), event("e2")]),
        ]);
        let listener = SnapshotListener::new(store, 20, Duration::from_millis(10));
        let (records, on_record) = recording_sink();

        let sub = listener.subscribe(on_record);
        tokio::time::sleep(Duration::from_millis(60)).await;
        sub.unsubscribe();

        let records = records.lock().unwrap();
        assert_eq!(
            records[..2],
            [
                ("e1".to_string(), RecordOrigin::InitialSnapshot),
                ("e2".to_string(), RecordOrigin::InitialSnapshot),
            ]
        );
        assert!(records[2..].contains(&("e3".to_string(), RecordOrigin::LiveAdd)));
        // e1/e2 are never re-reported.
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn failed_initial_query_retries_and_stays_initial() {
        let store = ScriptedStore::new(vec![
            Err(StoreError::Request("connection refused".into())),
            Ok(vec![event("e1")]),
            Ok(vec![event("e1"), event("e2")]),
        ]);
        let listener = SnapshotListener::new(store, 20, Duration::from_millis(10));
        let (records, on_record) = recording_sink();

        let sub = listener.subscribe(on_record);
        tokio::time::sleep(Duration::from_millis(80)).await;
        sub.unsubscribe();

        let records = records.lock().unwrap();
        // The first *successful* query is the initial snapshot.
        assert_eq!(records[0], ("e1".to_string(), RecordOrigin::InitialSnapshot));
        assert!(records.contains(&("e2".to_string(), RecordOrigin::LiveAdd)));
    }

    #[tokio::test]
    async fn no_records_are_delivered_after_unsubscribe() {
        let store = ScriptedStore::new(vec![Ok(vec![event("e1")])]);
        let listener = SnapshotListener::new(store, 20, Duration::from_millis(5));
        let (records, on_record) = recording_sink();

        let sub = listener.subscribe(on_record);
        tokio::time::sleep(Duration::from_millis(30)).await;
        sub.unsubscribe();
        let count_at_teardown = records.lock().unwrap().len();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(records.lock().unwrap().len(), count_at_teardown);
    }

    #[tokio::test]
    async fn unsubscribe_twice_is_a_noop() {
        let store = ScriptedStore::new(vec![]);
        let listener = SnapshotListener::new(store, 20, Duration::from_millis(5));
        let (_records, on_record) = recording_sink();

        let sub = listener.subscribe(on_record);
        sub.unsubscribe();
        sub.unsubscribe(); // second call must not panic or double-free
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn unsubscribe_from_inside_a_callback_is_safe() {
        let store = ScriptedStore::new(vec![
            Ok(vec![event("e1")]),
            Ok(vec![event("e1"), event("e2")]),
            Ok(vec![event("e1"), event("e2"), event("e3")]),
        ]);
        let listener = SnapshotListener::new(store, 20, Duration::from_millis(5));

        let sub_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let slot = Arc::clone(&sub_slot);
        let sink = Arc::clone(&delivered);
        let sub = listener.subscribe(move |e: RawEvent, origin: RecordOrigin| {
            sink.lock().unwrap().push(e.id.clone());
            // Tear down as soon as the first live record arrives.
            if origin == RecordOrigin::LiveAdd {
                if let Some(sub) = slot.lock().unwrap().as_ref() {
                    sub.unsubscribe();
                }
            }
        });
        *sub_slot.lock().unwrap() = Some(sub);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let delivered = delivered.lock().unwrap();
        // e1 (initial) and e2 (live) arrive; e3 never does.
        assert_eq!(*delivered, vec!["e1".to_string(), "e2".to_string()]);
    }
}
