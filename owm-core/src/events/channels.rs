//! Event channel factories and handles.
//!
//! Provides factory functions for creating event channels with appropriate
//! buffer sizes for the event-driven architecture.

use tokio::sync::mpsc;

use super::types::{AlertNotification, SessionEvent, SyncFailure};

/// Default buffer size for event channels.
///
/// Enough to absorb bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for SessionEvent events.
pub type SessionEventSender = mpsc::Sender<SessionEvent>;
/// Receiver handle for SessionEvent events.
pub type SessionEventReceiver = mpsc::Receiver<SessionEvent>;

/// Sender handle for AlertNotification events.
pub type AlertNotificationSender = mpsc::Sender<AlertNotification>;
/// Receiver handle for AlertNotification events.
pub type AlertNotificationReceiver = mpsc::Receiver<AlertNotification>;

/// Sender handle for SyncFailure events.
pub type SyncFailureSender = mpsc::Sender<SyncFailure>;
/// Receiver handle for SyncFailure events.
pub type SyncFailureReceiver = mpsc::Receiver<SyncFailure>;

/// Create a new SessionEvent channel.
pub fn session_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new AlertNotification channel.
pub fn alert_notification_channel() -> (AlertNotificationSender, AlertNotificationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new SyncFailure channel.
pub fn sync_failure_channel() -> (SyncFailureSender, SyncFailureReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Container for all event channel senders.
///
/// A convenient way to hand every sender to the components that emit events.
#[derive(Clone)]
pub struct EventSenders {
    /// Sender for SessionEvent events (used by WalletSession)
    pub session: SessionEventSender,
    /// Sender for AlertNotification events (used by AlertSynchronizer)
    pub notification: AlertNotificationSender,
    /// Sender for SyncFailure events (used by AlertSynchronizer)
    pub sync_failure: SyncFailureSender,
}

impl EventSenders {
    /// Create a new EventSenders container.
    pub fn new(
        session: SessionEventSender,
        notification: AlertNotificationSender,
        sync_failure: SyncFailureSender,
    ) -> Self {
        Self {
            session,
            notification,
            sync_failure,
        }
    }
}
