//! WalletSession processor.
//!
//! The WalletSession is responsible for:
//! - Tracking provider availability and the connection lifecycle
//! - Serving user-initiated connect/disconnect operations
//! - Applying externally observed account-change events in arrival order
//! - Publishing state through a watchable store and `SessionEvent`s
//!
//! Connection status is authoritative; balance is best-effort. A failed
//! balance query degrades to zero instead of failing the connect operation.

use std::convert::Infallible;
use std::sync::Arc;

use kanau::processor::Processor;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::entities::session::{ConnectionStatus, WalletSessionState};
use crate::events::{AccountsChanged, SessionEvent, SessionEventSender};
use crate::provider::{AccountsSubscription, ProviderError, WalletProvider};
use crate::state_store::StateStore;

/// Errors surfaced by session lifecycle operations.
///
/// Both variants are terminal for the attempted operation and are returned
/// to the caller; neither is retried automatically.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No wallet provider present; connecting cannot proceed.
    #[error("wallet provider unavailable")]
    ProviderUnavailable,

    /// The user declined the connection prompt.
    #[error("connection request rejected by the user")]
    UserRejected,

    /// Any other provider failure during connect.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// State machine over [`WalletSessionState`].
pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    state: StateStore<WalletSessionState>,
    event_tx: SessionEventSender,
}

impl WalletSession {
    /// Create a new session in `Disconnected`.
    pub fn new(provider: Arc<dyn WalletProvider>, event_tx: SessionEventSender) -> Self {
        Self {
            provider,
            state: StateStore::new(WalletSessionState::disconnected()),
            event_tx,
        }
    }

    /// Watchable session state, consumed by the presentation layer.
    pub fn state(&self) -> &StateStore<WalletSessionState> {
        &self.state
    }

    /// Current state snapshot.
    pub async fn snapshot(&self) -> WalletSessionState {
        self.state.snapshot().await
    }

    /// Silently restore a prior authorization without prompting.
    ///
    /// Queries already-authorized accounts; a non-empty answer moves the
    /// session straight to `Connected` with no `Connecting` interstitial.
    /// An unavailable provider or a failed query means "nothing to
    /// restore", not an error.
    pub async fn restore(&self) {
        if !self.provider.is_available() {
            debug!("no wallet provider available, nothing to restore");
            return;
        }

        let accounts = match self.provider.connected_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(error = %err, "account query failed, nothing to restore");
                return;
            }
        };
        let Some(address) = accounts.into_iter().next() else {
            debug!("no prior authorization to restore");
            return;
        };

        let balance = self.fetch_balance(&address).await;
        self.state
            .mutate(|state| {
                state.status = ConnectionStatus::Connected;
                state.address = Some(address.clone());
                state.balance = balance;
            })
            .await;

        info!(address = %address, %balance, "restored wallet session");
        self.emit(SessionEvent::Connected { address, balance }).await;
    }

    /// Connect to the wallet provider, prompting the user for authorization.
    ///
    /// A no-op when already `Connected` or `Connecting`: the claim on the
    /// `Connecting` slot is taken atomically under the state lock, so
    /// concurrent calls reach the provider prompt exactly once.
    pub async fn connect(&self) -> Result<(), SessionError> {
        if !self.provider.is_available() {
            return Err(SessionError::ProviderUnavailable);
        }

        let claimed = self
            .state
            .mutate(|state| {
                if state.status != ConnectionStatus::Disconnected {
                    return false;
                }
                state.status = ConnectionStatus::Connecting;
                true
            })
            .await;
        if !claimed {
            debug!("connect already in progress or session already connected");
            return Ok(());
        }

        let address = match self.provider.request_connection().await {
            Ok(address) => address,
            Err(err) => {
                // Nothing from the failed attempt is retained.
                self.state
                    .mutate(|state| *state = WalletSessionState::disconnected())
                    .await;
                warn!(error = %err, "wallet connection failed");
                return Err(match err {
                    ProviderError::Rejected => SessionError::UserRejected,
                    ProviderError::Unavailable => SessionError::ProviderUnavailable,
                    other => SessionError::Provider(other),
                });
            }
        };

        let balance = self.fetch_balance(&address).await;
        self.state
            .mutate(|state| {
                state.status = ConnectionStatus::Connected;
                state.address = Some(address.clone());
                state.balance = balance;
            })
            .await;

        info!(address = %address, %balance, "wallet connected");
        self.emit(SessionEvent::Connected { address, balance }).await;
        Ok(())
    }

    /// Reset the session to `Disconnected`.
    ///
    /// Purely local: the provider keeps its authorization (it has no revoke
    /// primitive), so a later [`restore`](Self::restore) may reconnect
    /// silently.
    pub async fn disconnect(&self) {
        self.state
            .mutate(|state| *state = WalletSessionState::disconnected())
            .await;
        info!("wallet disconnected");
        self.emit(SessionEvent::Disconnected).await;
    }

    /// Re-query the balance for the active address.
    ///
    /// Keeps the previous reading on failure. The update is skipped if the
    /// address changed while the query was in flight.
    pub async fn refresh_balance(&self) {
        let Some(address) = self.state.read().await.address.clone() else {
            return;
        };
        match self.provider.native_balance(&address).await {
            Ok(balance) => {
                let applied = self
                    .state
                    .mutate(|state| {
                        if state.address.as_deref() != Some(address.as_str()) {
                            return false;
                        }
                        state.balance = balance;
                        true
                    })
                    .await;
                if applied {
                    self.emit(SessionEvent::BalanceUpdated { balance }).await;
                }
            }
            Err(err) => warn!(address = %address, error = %err, "balance refresh failed"),
        }
    }

    /// Run until shutdown, applying provider account-change events strictly
    /// in arrival order.
    ///
    /// The subscription is dropped when the loop exits, deregistering the
    /// change handler along with the session.
    pub async fn run(
        self: Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
        mut subscription: AccountsSubscription,
    ) {
        info!("WalletSession started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("WalletSession received shutdown signal");
                        break;
                    }
                }

                changed = subscription.changed() => {
                    match changed {
                        Some(event) => {
                            let _ = self.process(event).await;
                        }
                        None => {
                            info!("account-change stream closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("WalletSession shutdown complete");
    }

    async fn fetch_balance(&self, address: &str) -> Decimal {
        match self.provider.native_balance(address).await {
            Ok(balance) => balance,
            Err(err) => {
                warn!(address = %address, error = %err, "balance query failed, defaulting to zero");
                Decimal::ZERO
            }
        }
    }

    async fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("session event receiver dropped");
        }
    }
}

impl Processor<AccountsChanged> for WalletSession {
    type Output = ();
    type Error = Infallible;

    /// Apply one externally observed account-change event. The latest event
    /// always wins: an empty set tears the session down, a non-empty set
    /// adopts its first account without re-fetching balance.
    async fn process(&self, event: AccountsChanged) -> Result<(), Infallible> {
        match event.accounts.into_iter().next() {
            None => {
                let was_connected = self
                    .state
                    .mutate(|state| {
                        let was_connected = state.status == ConnectionStatus::Connected;
                        *state = WalletSessionState::disconnected();
                        was_connected
                    })
                    .await;
                if was_connected {
                    info!("provider reported no authorized accounts, session disconnected");
                    self.emit(SessionEvent::Disconnected).await;
                }
            }
            Some(address) => {
                let switched = self
                    .state
                    .mutate(|state| {
                        if state.status == ConnectionStatus::Connected
                            && state.address.as_deref() == Some(address.as_str())
                        {
                            return false;
                        }
                        state.status = ConnectionStatus::Connected;
                        state.address = Some(address.clone());
                        true
                    })
                    .await;
                if switched {
                    info!(address = %address, "active account changed");
                    self.emit(SessionEvent::AccountChanged { address }).await;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::{Notify, broadcast};

    use super::*;
    use crate::events::session_event_channel;

    struct FakeProvider {
        available: bool,
        authorized: Vec<String>,
        connect_result: Result<String, ()>,
        balance: Option<Decimal>,
        prompts: AtomicUsize,
        prompt_gate: Option<Notify>,
        accounts_tx: broadcast::Sender<AccountsChanged>,
    }

    impl FakeProvider {
        fn new() -> Self {
            let (accounts_tx, _) = broadcast::channel(16);
            Self {
                available: true,
                authorized: Vec::new(),
                connect_result: Ok("0xabc".to_string()),
                balance: Some(Decimal::new(12345, 4)),
                prompts: AtomicUsize::new(0),
                prompt_gate: None,
                accounts_tx,
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FakeProvider {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn connected_accounts(&self) -> Result<Vec<String>, ProviderError> {
            Ok(self.authorized.clone())
        }

        async fn request_connection(&self) -> Result<String, ProviderError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.prompt_gate {
                gate.notified().await;
            }
            self.connect_result
                .clone()
                .map_err(|()| ProviderError::Rejected)
        }

        async fn native_balance(&self, _address: &str) -> Result<Decimal, ProviderError> {
            self.balance.ok_or(ProviderError::Parse("boom".to_string()))
        }

        fn subscribe_account_changes(&self) -> AccountsSubscription {
            AccountsSubscription::new(self.accounts_tx.subscribe())
        }
    }

    fn session_with(
        provider: FakeProvider,
    ) -> (
        Arc<WalletSession>,
        Arc<FakeProvider>,
        crate::events::SessionEventReceiver,
    ) {
        let provider = Arc::new(provider);
        let (tx, rx) = session_event_channel();
        let session = Arc::new(WalletSession::new(provider.clone(), tx));
        (session, provider, rx)
    }

    #[tokio::test]
    async fn connect_reaches_connected_with_balance() {
        let (session, _provider, mut events) = session_with(FakeProvider::new());

        session.connect().await.unwrap();

        let state = session.snapshot().await;
        assert!(state.is_connected());
        assert!(state.is_consistent());
        assert_eq!(state.address.as_deref(), Some("0xabc"));
        assert_eq!(state.balance, Decimal::new(12345, 4));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::Connected { .. }
        ));
    }

    #[tokio::test]
    async fn connect_fails_when_provider_unavailable() {
        let mut provider = FakeProvider::new();
        provider.available = false;
        let (session, _provider, _events) = session_with(provider);

        assert!(matches!(
            session.connect().await,
            Err(SessionError::ProviderUnavailable)
        ));
        assert!(!session.snapshot().await.is_connected());
    }

    #[tokio::test]
    async fn rejected_connect_retains_nothing() {
        let mut provider = FakeProvider::new();
        provider.connect_result = Err(());
        let (session, _provider, _events) = session_with(provider);

        assert!(matches!(
            session.connect().await,
            Err(SessionError::UserRejected)
        ));
        assert_eq!(session.snapshot().await, WalletSessionState::disconnected());
    }

    #[tokio::test]
    async fn concurrent_connects_prompt_once() {
        let mut provider = FakeProvider::new();
        provider.prompt_gate = Some(Notify::new());
        let (session, provider, _events) = session_with(provider);

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.connect().await }
        });
        // Let the first call claim the Connecting slot and block on the prompt.
        tokio::task::yield_now().await;

        // The second call must observe the in-flight attempt and no-op.
        session.connect().await.unwrap();

        provider.prompt_gate.as_ref().unwrap().notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(provider.prompts.load(Ordering::SeqCst), 1);
        assert!(session.snapshot().await.is_connected());
    }

    #[tokio::test]
    async fn balance_failure_degrades_to_zero() {
        let mut provider = FakeProvider::new();
        provider.balance = None;
        let (session, _provider, _events) = session_with(provider);

        session.connect().await.unwrap();

        let state = session.snapshot().await;
        assert!(state.is_connected());
        assert_eq!(state.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn restore_silently_connects_prior_authorization() {
        let mut provider = FakeProvider::new();
        provider.authorized = vec!["0xprior".to_string(), "0xother".to_string()];
        let (session, provider, mut events) = session_with(provider);

        session.restore().await;

        let state = session.snapshot().await;
        assert_eq!(state.address.as_deref(), Some("0xprior"));
        assert_eq!(provider.prompts.load(Ordering::SeqCst), 0);
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::Connected { .. }
        ));
    }

    #[tokio::test]
    async fn restore_with_nothing_authorized_stays_disconnected() {
        let (session, _provider, _events) = session_with(FakeProvider::new());
        session.restore().await;
        assert_eq!(session.snapshot().await, WalletSessionState::disconnected());
    }

    #[tokio::test]
    async fn disconnect_resets_locally() {
        let (session, _provider, _events) = session_with(FakeProvider::new());
        session.connect().await.unwrap();

        session.disconnect().await;

        assert_eq!(session.snapshot().await, WalletSessionState::disconnected());
    }

    #[tokio::test]
    async fn empty_account_event_tears_down_session() {
        let (session, _provider, mut events) = session_with(FakeProvider::new());
        session.connect().await.unwrap();
        let _ = events.recv().await;

        session
            .process(AccountsChanged { accounts: vec![] })
            .await
            .unwrap();

        assert_eq!(session.snapshot().await, WalletSessionState::disconnected());
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::Disconnected
        ));
    }

    #[tokio::test]
    async fn address_tracks_last_account_event() {
        let (session, _provider, _events) = session_with(FakeProvider::new());

        let sequences = [
            vec!["0x1".to_string()],
            vec!["0x2".to_string(), "0x3".to_string()],
            vec![],
            vec!["0x4".to_string()],
        ];
        for accounts in sequences {
            let expected = accounts.first().cloned();
            session.process(AccountsChanged { accounts }).await.unwrap();
            assert_eq!(session.snapshot().await.address, expected);
            assert!(session.snapshot().await.is_consistent());
        }
    }

    #[tokio::test]
    async fn account_switch_keeps_stale_balance() {
        let (session, _provider, mut events) = session_with(FakeProvider::new());
        session.connect().await.unwrap();
        let _ = events.recv().await;
        let balance_before = session.snapshot().await.balance;

        session
            .process(AccountsChanged {
                accounts: vec!["0xnew".to_string()],
            })
            .await
            .unwrap();

        let state = session.snapshot().await;
        assert_eq!(state.address.as_deref(), Some("0xnew"));
        assert_eq!(state.balance, balance_before);
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::AccountChanged { address } if address == "0xnew"
        ));
    }
}
