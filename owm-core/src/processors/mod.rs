//! Event processors.
//!
//! - `WalletSession`: owns the connection state machine, applies provider
//!   account-change events, emits `SessionEvent`
//! - `AlertSynchronizer`: polls the alert source for the bound address,
//!   emits `AlertNotification` and `SyncFailure`

pub mod alert_sync;
pub mod wallet_session;

pub use alert_sync::{AlertSynchronizer, DEFAULT_POLL_INTERVAL, RECENT_ALERTS_LIMIT};
pub use wallet_session::{SessionError, WalletSession};
