//! Event type definitions.

use compact_str::CompactString;
use rust_decimal::Decimal;

use crate::entities::AlertSeverity;
use crate::entities::alert::Alert;

/// Account set reported by the provider's account-change stream.
///
/// An empty set means the user revoked or disconnected all accounts in the
/// provider UI; a non-empty set makes its first entry the active account.
#[derive(Debug, Clone)]
pub struct AccountsChanged {
    pub accounts: Vec<String>,
}

/// Lifecycle events emitted by the wallet session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session reached `Connected`, through `connect()` or a silent
    /// restore of a prior authorization.
    Connected { address: String, balance: Decimal },
    /// The externally active account switched while a session was live.
    /// Balance is not re-fetched on this path; consumers may call
    /// `refresh_balance` if they want a fresh reading.
    AccountChanged { address: String },
    /// A balance refresh completed for the active address.
    BalanceUpdated { balance: Decimal },
    /// The session returned to `Disconnected`.
    Disconnected,
}

/// One notification per newly observed alert, emitted exactly once in
/// ascending raised-at order within a poll cycle.
#[derive(Debug, Clone)]
pub struct AlertNotification {
    pub symbol: CompactString,
    pub severity: AlertSeverity,
    pub message: String,
    pub source: String,
    pub chain: Option<String>,
    pub url: Option<String>,
}

impl From<&Alert> for AlertNotification {
    fn from(alert: &Alert) -> Self {
        Self {
            symbol: alert.symbol.clone(),
            severity: alert.severity,
            message: alert.message.clone(),
            source: alert.source.clone(),
            chain: alert.chain.clone(),
            url: alert.url.clone(),
        }
    }
}

/// Observability side channel: one event per failed poll cycle.
///
/// The synchronizer keeps its last-known-good state on failure, so this is
/// the only signal that a cycle was skipped.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub address: String,
    pub reason: String,
}
