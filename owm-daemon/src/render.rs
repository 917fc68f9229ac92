//! Terminal rendering sink.
//!
//! Consumes notification and sync-failure events plus the watchable session
//! state and recent-alerts view, and renders them as log lines. This is the
//! whole presentation layer of the daemon: anything richer (cards, charts,
//! toasts) belongs to a frontend consuming the same events.

use owm_core::entities::alert::Alert;
use owm_core::entities::session::{ConnectionStatus, WalletSessionState};
use owm_core::events::{AlertNotification, AlertNotificationReceiver, SyncFailureReceiver};
use owm_core::state_store::StateStore;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{info, warn};

/// Render events until shutdown.
pub async fn run_render_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    mut notification_rx: AlertNotificationReceiver,
    mut failure_rx: SyncFailureReceiver,
    session_state: StateStore<WalletSessionState>,
    recent_alerts: StateStore<Vec<Alert>>,
) {
    let mut session_watcher = session_state.subscribe();
    let mut alerts_watcher = recent_alerts.subscribe();

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            Some(notification) = notification_rx.recv() => {
                render_notification(&notification);
            }

            Some(failure) = failure_rx.recv() => {
                warn!(
                    address = %short_address(&failure.address),
                    reason = %failure.reason,
                    "alert sync failed, showing last known data"
                );
            }

            Ok(()) = session_watcher.changed() => {
                render_session(&session_state.snapshot().await);
            }

            Ok(()) = alerts_watcher.changed() => {
                render_recent(&recent_alerts.snapshot().await);
            }
        }
    }
}

fn render_notification(notification: &AlertNotification) {
    warn!(
        severity = %notification.severity,
        chain = notification.chain.as_deref().unwrap_or("Unknown"),
        source = %notification.source,
        url = notification.url.as_deref().unwrap_or(""),
        "{} Alert: {}",
        notification.symbol,
        notification.message,
    );
}

fn render_session(state: &WalletSessionState) {
    match state.status {
        ConnectionStatus::Connected => {
            let address = state.address.as_deref().unwrap_or_default();
            info!(
                address = %short_address(address),
                balance = %state.balance,
                "wallet connected"
            );
        }
        ConnectionStatus::Connecting => info!("wallet connecting, waiting for approval"),
        ConnectionStatus::Disconnected => info!("wallet disconnected"),
    }
}

fn render_recent(alerts: &[Alert]) {
    if alerts.is_empty() {
        info!("no active alerts at the moment");
        return;
    }
    let now = OffsetDateTime::now_utc();
    for alert in alerts {
        info!(
            severity = %alert.severity,
            source = %alert.source,
            "[{}] {}: {} ({})",
            alert.chain.as_deref().unwrap_or("Unknown"),
            alert.symbol,
            alert.message,
            relative_age(alert.raised_at, now),
        );
    }
}

/// Shorten a wallet address for display: `0x1234…abcd`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

/// Human-readable age of a timestamp relative to `now`.
pub fn relative_age(at: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - at;
    if elapsed.whole_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.whole_minutes() < 60 {
        format!("{} min ago", elapsed.whole_minutes())
    } else if elapsed.whole_hours() < 24 {
        format!("{} h ago", elapsed.whole_hours())
    } else {
        format!("{} d ago", elapsed.whole_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn shortens_long_addresses() {
        assert_eq!(
            short_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
    }

    #[test]
    fn keeps_short_addresses_intact() {
        assert_eq!(short_address("0xdemo"), "0xdemo");
    }

    #[test]
    fn relative_age_buckets() {
        let now = datetime!(2025-05-10 12:00:00 UTC);
        assert_eq!(relative_age(datetime!(2025-05-10 11:59:30 UTC), now), "just now");
        assert_eq!(relative_age(datetime!(2025-05-10 11:55:00 UTC), now), "5 min ago");
        assert_eq!(relative_age(datetime!(2025-05-10 09:00:00 UTC), now), "3 h ago");
        assert_eq!(relative_age(datetime!(2025-05-08 12:00:00 UTC), now), "2 d ago");
    }
}
