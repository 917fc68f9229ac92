//! Event system connecting the session, the synchronizer and the
//! presentation layer.
//!
//! # Event Flow
//!
//! 1. Provider account-change stream -> `AccountsChanged` -> `WalletSession`
//! 2. `WalletSession` emits `SessionEvent` -> synchronizer driver
//! 3. `AlertSynchronizer` emits `AlertNotification` -> notification sink
//! 4. `AlertSynchronizer` emits `SyncFailure` -> observability sink
//!
//! Events are ephemeral: nothing is persisted, and consumers that need
//! current state read it from the watchable stores instead of replaying
//! events.

pub mod channels;
pub mod types;

pub use channels::{
    AlertNotificationReceiver, AlertNotificationSender, DEFAULT_CHANNEL_BUFFER, EventSenders,
    SessionEventReceiver, SessionEventSender, SyncFailureReceiver, SyncFailureSender,
    alert_notification_channel, session_event_channel, sync_failure_channel,
};

pub use types::{AccountsChanged, AlertNotification, SessionEvent, SyncFailure};
