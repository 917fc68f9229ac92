use rust_decimal::Decimal;

/// Connection lifecycle phase of the wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot of the wallet session.
///
/// Invariant: `address` is `Some` if and only if `status` is `Connected`.
/// `balance` is meaningful only while an address is set and is zero when
/// disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSessionState {
    pub status: ConnectionStatus,
    pub address: Option<String>,
    /// Native-currency balance of `address`, 4 fractional digits.
    pub balance: Decimal,
}

impl WalletSessionState {
    /// The initial state: no provider interaction has happened yet.
    pub fn disconnected() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            address: None,
            balance: Decimal::ZERO,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Whether the address/status invariant holds.
    pub fn is_consistent(&self) -> bool {
        self.address.is_some() == (self.status == ConnectionStatus::Connected)
    }
}

impl Default for WalletSessionState {
    fn default() -> Self {
        Self::disconnected()
    }
}
