//! Demo provider and alert source.
//!
//! Lets the daemon run end-to-end without a wallet bridge or a backend:
//! the provider always exposes one authorized account, and the alert source
//! serves a fixed cross-chain baseline plus occasionally minted new alerts
//! so the notification path stays observable.

use async_trait::async_trait;
use owm_core::entities::AlertSeverity;
use owm_core::entities::alert::Alert;
use owm_core::events::AccountsChanged;
use owm_core::provider::{AccountsSubscription, ProviderError, WalletProvider};
use owm_core::source::{AlertSource, FetchError};
use owm_core::utils::severity::severity_for_score;
use rand::Rng;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

/// The single account the demo provider exposes.
pub const DEMO_ADDRESS: &str = "0x9a42f2bc6dd87d24c0f5b0a2cd9d9c6f4be3a918";

/// Always-available wallet provider with one pre-authorized account.
pub struct DemoWalletProvider {
    accounts_tx: broadcast::Sender<AccountsChanged>,
}

impl DemoWalletProvider {
    pub fn new() -> Self {
        let (accounts_tx, _) = broadcast::channel(4);
        Self { accounts_tx }
    }
}

impl Default for DemoWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for DemoWalletProvider {
    fn is_available(&self) -> bool {
        true
    }

    async fn connected_accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![DEMO_ADDRESS.to_string()])
    }

    async fn request_connection(&self) -> Result<String, ProviderError> {
        Ok(DEMO_ADDRESS.to_string())
    }

    async fn native_balance(&self, _address: &str) -> Result<Decimal, ProviderError> {
        Ok(Decimal::new(32_000, 4))
    }

    fn subscribe_account_changes(&self) -> AccountsSubscription {
        // The demo account never changes; the stream just stays open.
        AccountsSubscription::new(self.accounts_tx.subscribe())
    }
}

/// Candidate content for minted alerts.
const MINT_POOL: &[(&str, &str, &str, &str)] = &[
    (
        "SOL",
        "Solana",
        "Network instability reported",
        "BlockchainMonitor",
    ),
    (
        "ETH",
        "Ethereum",
        "Unusual validator exit volume",
        "Regulatory Watch",
    ),
    (
        "BTC",
        "Bitcoin",
        "Mining difficulty adjustment expected",
        "BitcoinAnalytics",
    ),
    (
        "BNB",
        "BNB Chain",
        "New regulatory compliance requirements",
        "BinanceNews",
    ),
    (
        "ROSE",
        "Oasis Sapphire Testnet",
        "Testnet performance improvements",
        "Oasis Labs",
    ),
];

/// Alert source serving generated data.
pub struct DemoAlertSource {
    started_at: OffsetDateTime,
    minted: Mutex<Vec<Alert>>,
}

impl DemoAlertSource {
    pub fn new() -> Self {
        Self {
            started_at: OffsetDateTime::now_utc(),
            minted: Mutex::new(Vec::new()),
        }
    }

    fn base_alerts(&self) -> Vec<Alert> {
        let base = |id: &str, symbol: &str, chain: &str, severity: AlertSeverity, message: &str, source: &str, hours_ago: i64| Alert {
            id: id.to_string(),
            asset_id: symbol.to_lowercase(),
            symbol: symbol.into(),
            severity,
            message: message.to_string(),
            source: source.to_string(),
            raised_at: self.started_at - Duration::hours(hours_ago),
            url: Some(format!("https://example.com/{id}")),
            chain: Some(chain.to_string()),
        };
        vec![
            base("alert1", "SOL", "Solana", AlertSeverity::High, "Network instability reported", "BlockchainMonitor", 0),
            base("alert2", "ETH", "Ethereum", AlertSeverity::Medium, "Potential regulatory concerns", "Regulatory Watch", 1),
            base("alert3", "ROSE", "Oasis Sapphire Testnet", AlertSeverity::Low, "Testnet performance improvements", "Oasis Labs", 2),
            base("alert4", "BTC", "Bitcoin", AlertSeverity::Medium, "Mining difficulty adjustment expected", "BitcoinAnalytics", 3),
            base("alert5", "BNB", "BNB Chain", AlertSeverity::High, "New regulatory compliance requirements", "BinanceNews", 4),
        ]
    }
}

impl Default for DemoAlertSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSource for DemoAlertSource {
    async fn fetch(&self, _address: &str) -> Result<Vec<Alert>, FetchError> {
        let mut minted = self.minted.lock().await;
        if rand::rng().random_bool(0.35) {
            minted.push(mint_alert());
        }

        let mut alerts = self.base_alerts();
        alerts.extend(minted.iter().cloned());
        Ok(alerts)
    }
}

fn mint_alert() -> Alert {
    let mut rng = rand::rng();
    let (symbol, chain, message, source) = MINT_POOL[rng.random_range(0..MINT_POOL.len())];
    let score: f64 = rng.random_range(20.0..100.0);
    let id = Uuid::new_v4().to_string();
    Alert {
        url: Some(format!("https://example.com/{id}")),
        id,
        asset_id: symbol.to_lowercase(),
        symbol: symbol.into(),
        severity: severity_for_score(score),
        message: message.to_string(),
        source: source.to_string(),
        raised_at: OffsetDateTime::now_utc(),
        chain: Some(chain.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_provider_restores_silently() {
        let provider = DemoWalletProvider::new();
        assert!(provider.is_available());
        assert_eq!(
            provider.connected_accounts().await.unwrap(),
            vec![DEMO_ADDRESS.to_string()]
        );
    }

    #[tokio::test]
    async fn fetch_always_includes_the_baseline() {
        let source = DemoAlertSource::new();
        let alerts = source.fetch(DEMO_ADDRESS).await.unwrap();
        assert!(alerts.len() >= 5);
        assert!(alerts.iter().any(|a| a.id == "alert1"));
    }

    #[test]
    fn minted_alerts_have_unique_ids() {
        let a = mint_alert();
        let b = mint_alert();
        assert_ne!(a.id, b.id);
    }
}
