//! AlertSynchronizer processor.
//!
//! The AlertSynchronizer is responsible for:
//! - Polling the alert source for the bound address on a fixed cadence
//! - Diffing each result against the ids seen in the previous cycle
//! - Emitting one `AlertNotification` per genuinely new alert, oldest first
//! - Keeping a bounded, deduplicated, most-recent-first view of the latest
//!   successful poll
//!
//! The first poll after `start` is a baseline: it populates the seen set
//! and the view but emits no notifications. Every poll result carries the
//! generation it was issued under; a result whose generation is stale
//! (because `stop` was called or the target changed) is discarded without
//! touching state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::entities::alert::Alert;
use crate::events::{AlertNotification, AlertNotificationSender, SyncFailure, SyncFailureSender};
use crate::source::AlertSource;
use crate::state_store::StateStore;

/// Fixed cadence between alert fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum number of alerts retained in the recent view.
pub const RECENT_ALERTS_LIMIT: usize = 5;

struct SyncState {
    target: Option<String>,
    seen: HashSet<String>,
    /// Set once the baseline poll under the current target has applied.
    primed: bool,
    generation: u64,
}

struct Shared {
    source: Arc<dyn AlertSource>,
    notification_tx: AlertNotificationSender,
    failure_tx: SyncFailureSender,
    view: StateStore<Vec<Alert>>,
    state: Mutex<SyncState>,
}

/// Polls the alert source for the currently bound address and maintains the
/// deduplicated, bounded recent-alerts view.
pub struct AlertSynchronizer {
    shared: Arc<Shared>,
    poll_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AlertSynchronizer {
    pub fn new(
        source: Arc<dyn AlertSource>,
        notification_tx: AlertNotificationSender,
        failure_tx: SyncFailureSender,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                notification_tx,
                failure_tx,
                view: StateStore::new(Vec::new()),
                state: Mutex::new(SyncState {
                    target: None,
                    seen: HashSet::new(),
                    primed: false,
                    generation: 0,
                }),
            }),
            poll_interval: DEFAULT_POLL_INTERVAL,
            task: Mutex::new(None),
        }
    }

    /// Override the polling cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Watchable recent-alerts view, consumed by the presentation layer.
    /// Always at most [`RECENT_ALERTS_LIMIT`] entries, most recent first,
    /// no duplicate ids.
    pub fn recent_alerts(&self) -> &StateStore<Vec<Alert>> {
        &self.shared.view
    }

    /// Begin polling alerts for `address`, immediately and then on every
    /// interval tick.
    ///
    /// Switching to a different address clears the seen set and the view
    /// before the first poll under the new target; restarting on the same
    /// address keeps the last-known-good view until fresh data arrives.
    /// Either way the next poll is a baseline that emits no notifications.
    pub async fn start(&self, address: impl Into<String>) {
        let address = address.into();
        let generation = {
            let mut state = self.shared.state.lock().await;
            state.generation += 1;
            state.primed = false;
            if state.target.as_deref() != Some(address.as_str()) {
                state.seen.clear();
                state.target = Some(address.clone());
                self.shared.view.update(Vec::new()).await;
            }
            state.generation
        };

        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }
        info!(address = %address, "alert polling started");
        let shared = Arc::clone(&self.shared);
        let interval = self.poll_interval;
        *task = Some(tokio::spawn(async move {
            shared.poll_loop(address, generation, interval).await;
        }));
    }

    /// Stop polling. Idempotent. Any in-flight poll becomes a no-op: its
    /// generation is stale by the time the result could be applied.
    pub async fn stop(&self) {
        {
            let mut state = self.shared.state.lock().await;
            state.generation += 1;
        }
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
            info!("alert polling stopped");
        }
    }
}

impl Shared {
    async fn poll_loop(self: Arc<Self>, address: String, generation: u64, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.state.lock().await.generation != generation {
                debug!(address = %address, "poll loop superseded");
                break;
            }

            match self.source.fetch(&address).await {
                Ok(alerts) => self.apply_poll(&address, generation, alerts).await,
                Err(err) => {
                    if self.state.lock().await.generation != generation {
                        break;
                    }
                    warn!(address = %address, error = %err, "alert poll failed, keeping last known state");
                    let _ = self
                        .failure_tx
                        .send(SyncFailure {
                            address: address.clone(),
                            reason: err.to_string(),
                        })
                        .await;
                }
            }
        }
    }

    /// Apply one successful poll result, unless it is stale.
    async fn apply_poll(&self, address: &str, generation: u64, alerts: Vec<Alert>) {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(address = %address, "discarding stale poll result");
            return;
        }

        // Diff before the seen set is replaced. The baseline poll reports
        // nothing: there is no previous cycle to compare against.
        let fresh: Vec<Alert> = if state.primed {
            alerts
                .iter()
                .filter(|alert| !state.seen.contains(&alert.id))
                .cloned()
                .sorted_by(|a, b| a.raised_at.cmp(&b.raised_at))
                .collect()
        } else {
            Vec::new()
        };

        state.seen = alerts.iter().map(|alert| alert.id.clone()).collect();
        state.primed = true;

        let view: Vec<Alert> = alerts
            .into_iter()
            .sorted_by(|a, b| b.raised_at.cmp(&a.raised_at))
            .unique_by(|alert| alert.id.clone())
            .take(RECENT_ALERTS_LIMIT)
            .collect();
        debug!(address = %address, alerts = view.len(), fresh = fresh.len(), "poll applied");
        self.view.update(view).await;

        for alert in &fresh {
            info!(id = %alert.id, symbol = %alert.symbol, severity = %alert.severity, "new alert observed");
            if self
                .notification_tx
                .send(AlertNotification::from(alert))
                .await
                .is_err()
            {
                debug!("notification receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use time::OffsetDateTime;

    use super::*;
    use crate::entities::AlertSeverity;
    use crate::events::{
        AlertNotificationReceiver, SyncFailureReceiver, alert_notification_channel,
        sync_failure_channel,
    };
    use crate::source::FetchError;

    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<Alert>, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<Alert>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl AlertSource for ScriptedSource {
        async fn fetch(&self, _address: &str) -> Result<Vec<Alert>, FetchError> {
            match self.responses.lock().await.pop_front() {
                Some(response) => response,
                // Script exhausted: report an empty-but-successful poll so
                // extra ticks do not invent alerts.
                None => Ok(Vec::new()),
            }
        }
    }

    fn alert(id: &str, unix: i64) -> Alert {
        Alert {
            id: id.to_string(),
            asset_id: "solana".to_string(),
            symbol: "SOL".into(),
            severity: AlertSeverity::High,
            message: format!("alert {id}"),
            source: "BlockchainMonitor".to_string(),
            raised_at: OffsetDateTime::from_unix_timestamp(unix).unwrap(),
            url: None,
            chain: Some("Solana".to_string()),
        }
    }

    fn synchronizer(
        responses: Vec<Result<Vec<Alert>, FetchError>>,
    ) -> (
        AlertSynchronizer,
        AlertNotificationReceiver,
        SyncFailureReceiver,
    ) {
        let (notification_tx, notification_rx) = alert_notification_channel();
        let (failure_tx, failure_rx) = sync_failure_channel();
        let sync = AlertSynchronizer::new(
            Arc::new(ScriptedSource::new(responses)),
            notification_tx,
            failure_tx,
        );
        (sync, notification_rx, failure_rx)
    }

    /// Let the spawned poll loop run its pending tick under the paused clock.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    async fn advance_past_interval() {
        tokio::time::sleep(DEFAULT_POLL_INTERVAL + Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_poll_emits_no_notifications() {
        let (sync, mut notifications, _failures) =
            synchronizer(vec![Ok(vec![alert("a1", 100), alert("a2", 200)])]);

        sync.start("0xA").await;
        settle().await;

        assert!(notifications.try_recv().is_err());
        let view = sync.recent_alerts().snapshot().await;
        assert_eq!(
            view.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a2", "a1"]
        );
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn second_poll_notifies_exactly_the_new_alerts() {
        let (sync, mut notifications, _failures) = synchronizer(vec![
            Ok(vec![alert("a1", 100), alert("a2", 200)]),
            Ok(vec![alert("a1", 100), alert("a2", 200), alert("a3", 300)]),
        ]);

        sync.start("0xA").await;
        settle().await;
        advance_past_interval().await;

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.symbol, "SOL");
        assert_eq!(notification.message, "alert a3");
        assert!(notifications.try_recv().is_err());

        let view = sync.recent_alerts().snapshot().await;
        assert_eq!(
            view.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a3", "a2", "a1"]
        );
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn new_alerts_are_notified_oldest_first() {
        let (sync, mut notifications, _failures) = synchronizer(vec![
            Ok(vec![alert("a1", 100)]),
            Ok(vec![alert("a1", 100), alert("a3", 300), alert("a2", 200)]),
        ]);

        sync.start("0xA").await;
        settle().await;
        advance_past_interval().await;

        assert_eq!(notifications.try_recv().unwrap().message, "alert a2");
        assert_eq!(notifications.try_recv().unwrap().message, "alert a3");
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn view_is_bounded_deduplicated_and_sorted() {
        let many: Vec<Alert> = (0..8).map(|i| alert(&format!("a{i}"), 100 + i)).collect();
        let mut with_duplicate = many.clone();
        with_duplicate.push(alert("a7", 107));
        let (sync, _notifications, _failures) = synchronizer(vec![Ok(with_duplicate)]);

        sync.start("0xA").await;
        settle().await;

        let view = sync.recent_alerts().snapshot().await;
        assert_eq!(view.len(), RECENT_ALERTS_LIMIT);
        assert_eq!(
            view.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a7", "a6", "a5", "a4", "a3"]
        );
        assert!(view.windows(2).all(|w| w[0].raised_at >= w[1].raised_at));
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_state_and_reports_side_channel() {
        let (sync, mut notifications, mut failures) = synchronizer(vec![
            Ok(vec![alert("a1", 100)]),
            Err(FetchError::Decode("boom".to_string())),
            Ok(vec![alert("a1", 100), alert("a2", 200)]),
        ]);

        sync.start("0xA").await;
        settle().await;
        advance_past_interval().await;

        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.address, "0xA");
        assert_eq!(sync.recent_alerts().snapshot().await.len(), 1);

        // The next regular tick proceeds normally and still diffs against
        // the last successful poll.
        advance_past_interval().await;
        assert_eq!(notifications.try_recv().unwrap().message, "alert a2");
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stale_result_after_stop_is_discarded() {
        let (sync, mut notifications, _failures) =
            synchronizer(vec![Ok(vec![alert("a1", 100)])]);

        sync.start("0xA").await;
        settle().await;
        let stale_generation = sync.shared.state.lock().await.generation;
        sync.stop().await;

        sync.shared
            .apply_poll("0xA", stale_generation, vec![alert("a9", 900)])
            .await;

        assert!(notifications.try_recv().is_err());
        let view = sync.recent_alerts().snapshot().await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "a1");
        let state = sync.shared.state.lock().await;
        assert!(!state.seen.contains("a9"));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_address_resets_seen_state_and_view() {
        let (sync, mut notifications, _failures) = synchronizer(vec![
            Ok(vec![alert("a1", 100)]),
            Ok(vec![alert("b1", 500)]),
            Ok(vec![alert("b1", 500), alert("b2", 600)]),
        ]);

        sync.start("0xA").await;
        settle().await;
        assert_eq!(sync.recent_alerts().snapshot().await.len(), 1);

        sync.start("0xB").await;
        // The view is cleared before the first poll under the new address.
        settle().await;

        // Baseline under 0xB: b1 must not be notified even though it was
        // never seen under 0xA.
        assert!(notifications.try_recv().is_err());

        advance_past_interval().await;
        assert_eq!(notifications.try_recv().unwrap().message, "alert b2");
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_same_address_is_a_cold_start() {
        let (sync, mut notifications, _failures) = synchronizer(vec![
            Ok(vec![alert("a1", 100)]),
            Ok(vec![alert("a1", 100), alert("a2", 200)]),
        ]);

        sync.start("0xA").await;
        settle().await;
        sync.stop().await;

        sync.start("0xA").await;
        settle().await;

        // a2 arrives on the first poll after the restart: baseline, silent.
        assert!(notifications.try_recv().is_err());
        assert_eq!(sync.recent_alerts().snapshot().await.len(), 2);
        sync.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (sync, _notifications, _failures) = synchronizer(vec![Ok(vec![alert("a1", 100)])]);
        sync.start("0xA").await;
        settle().await;
        sync.stop().await;
        sync.stop().await;
    }
}
