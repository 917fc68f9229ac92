//! Wallet provider capability.
//!
//! The provider is the externally controlled wallet surface (browser
//! extension or local bridge) that owns account authorization and balance
//! queries. The session never talks to it except through [`WalletProvider`],
//! so tests substitute a fake adapter.

pub mod rpc;

pub use rpc::RpcWalletProvider;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::AccountsChanged;

/// Errors surfaced by a wallet provider adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No wallet provider is present in this environment.
    #[error("no wallet provider is available")]
    Unavailable,

    /// The user declined the connection prompt.
    #[error("connection request rejected by the user")]
    Rejected,

    /// Transport-level failure talking to the provider.
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider returned a JSON-RPC error.
    #[error("provider rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The provider answered with something we could not interpret.
    #[error("malformed provider response: {0}")]
    Parse(String),
}

/// Capability interface over the external wallet provider.
///
/// Implementations hold no session state of their own; the session state
/// machine owns all lifecycle bookkeeping.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet provider is present at all.
    fn is_available(&self) -> bool;

    /// Accounts the user has already authorized, without prompting.
    /// Empty when nothing is authorized or the provider is absent.
    async fn connected_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Prompt the user to authorize a connection and return the first
    /// authorized account. Suspends for as long as the provider UI is open.
    async fn request_connection(&self) -> Result<String, ProviderError>;

    /// Native-currency balance of `address`, denominated from the
    /// provider's smallest-unit reading via [`wei_to_native`].
    async fn native_balance(&self, address: &str) -> Result<Decimal, ProviderError>;

    /// Subscribe to externally observed account-set changes.
    ///
    /// At most one active subscription per provider instance is required.
    /// Dropping the subscription deregisters it.
    fn subscribe_account_changes(&self) -> AccountsSubscription;
}

/// Handle to a provider's account-change stream.
pub struct AccountsSubscription {
    rx: broadcast::Receiver<AccountsChanged>,
}

impl AccountsSubscription {
    pub fn new(rx: broadcast::Receiver<AccountsChanged>) -> Self {
        Self { rx }
    }

    /// The next account-change event, in provider emission order.
    ///
    /// A lagging receiver skips straight to the newest event (the latest
    /// account set always wins). Returns `None` once the provider side is
    /// gone.
    pub async fn changed(&mut self) -> Option<AccountsChanged> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "account-change subscription lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Number of fractional digits retained when denominating native balances.
pub const BALANCE_SCALE: u32 = 4;

const WEI_PER_NATIVE: u128 = 1_000_000_000_000_000_000;

/// Convert a smallest-unit (wei) reading into a native-currency decimal
/// with [`BALANCE_SCALE`] fractional digits, truncating anything finer.
pub fn wei_to_native(wei: u128) -> Decimal {
    let units = wei / (WEI_PER_NATIVE / 10u128.pow(BALANCE_SCALE));
    Decimal::try_from_i128_with_scale(units as i128, BALANCE_SCALE).unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_native_unit() {
        assert_eq!(wei_to_native(WEI_PER_NATIVE).to_string(), "1.0000");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 1.99999… must not round up to 2.0000.
        assert_eq!(wei_to_native(1_999_999_999_999_999_999).to_string(), "1.9999");
    }

    #[test]
    fn zero_balance() {
        assert_eq!(wei_to_native(0).to_string(), "0.0000");
    }

    #[test]
    fn sub_precision_dust_is_dropped() {
        // 0.000099999… native units, below the retained precision.
        assert_eq!(wei_to_native(99_999_999_999_999).to_string(), "0.0000");
    }

    #[test]
    fn large_balances_keep_scale() {
        assert_eq!(
            wei_to_native(123_456 * WEI_PER_NATIVE).to_string(),
            "123456.0000"
        );
    }
}
