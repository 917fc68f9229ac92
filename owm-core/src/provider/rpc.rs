//! JSON-RPC wallet bridge adapter.
//!
//! Speaks the injected-provider verb set (`eth_accounts`,
//! `eth_requestAccounts`, `eth_getBalance`) against a wallet-bridge HTTP
//! endpoint. `eth_requestAccounts` blocks on the bridge side until the user
//! answers the authorization prompt; EIP-1193 error code 4001 maps to
//! [`ProviderError::Rejected`].
//!
//! An unset endpoint models "no wallet extension installed":
//! `is_available()` is false and every call fails with
//! [`ProviderError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use super::{AccountsSubscription, ProviderError, WalletProvider, wei_to_native};
use crate::events::AccountsChanged;

/// EIP-1193: the user rejected the request.
const USER_REJECTED_CODE: i64 = 4001;

/// Default cadence for polling the bridge for externally changed accounts.
pub const DEFAULT_ACCOUNTS_POLL: Duration = Duration::from_secs(5);

/// Wallet provider backed by a JSON-RPC wallet bridge.
pub struct RpcWalletProvider {
    http: Client,
    endpoint: Option<Url>,
    accounts_tx: broadcast::Sender<AccountsChanged>,
    accounts_poll: Duration,
}

impl RpcWalletProvider {
    /// Create a new provider. `None` means no bridge is configured, i.e.
    /// no wallet extension is present.
    pub fn new(endpoint: Option<Url>) -> Self {
        let (accounts_tx, _) = broadcast::channel(16);
        let http = Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            endpoint,
            accounts_tx,
            accounts_poll: DEFAULT_ACCOUNTS_POLL,
        }
    }

    /// Override the account-change polling cadence.
    pub fn with_accounts_poll(mut self, interval: Duration) -> Self {
        self.accounts_poll = interval;
        self
    }

    /// Spawn the background watcher that polls `eth_accounts` and
    /// broadcasts the account set whenever it differs from the previous
    /// reading. Runs until shutdown is signaled.
    pub fn spawn_accounts_watcher(&self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let tx = self.accounts_tx.clone();
        let interval = self.accounts_poll;

        tokio::spawn(async move {
            let Some(endpoint) = endpoint else {
                debug!("no wallet bridge configured, account watcher idle");
                return;
            };

            info!("account watcher started");
            let mut last: Option<Vec<String>> = None;

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("account watcher shutting down");
                            break;
                        }
                    }

                    _ = tokio::time::sleep(interval) => {
                        match rpc_call::<Vec<String>>(&http, &endpoint, "eth_accounts", json!([])).await {
                            Ok(accounts) => {
                                if last.as_ref() != Some(&accounts) {
                                    // The first reading is a baseline, not a change.
                                    if last.is_some() {
                                        let _ = tx.send(AccountsChanged {
                                            accounts: accounts.clone(),
                                        });
                                    }
                                    last = Some(accounts);
                                }
                            }
                            Err(err) => debug!(error = %err, "account poll failed"),
                        }
                    }
                }
            }
        })
    }

    fn endpoint(&self) -> Result<&Url, ProviderError> {
        self.endpoint.as_ref().ok_or(ProviderError::Unavailable)
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    fn is_available(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn connected_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let endpoint = self.endpoint()?;
        rpc_call(&self.http, endpoint, "eth_accounts", json!([])).await
    }

    async fn request_connection(&self) -> Result<String, ProviderError> {
        let endpoint = self.endpoint()?;
        let accounts: Vec<String> =
            rpc_call(&self.http, endpoint, "eth_requestAccounts", json!([])).await?;
        accounts.into_iter().next().ok_or(ProviderError::Rejected)
    }

    async fn native_balance(&self, address: &str) -> Result<Decimal, ProviderError> {
        let endpoint = self.endpoint()?;
        let raw: String =
            rpc_call(&self.http, endpoint, "eth_getBalance", json!([address, "latest"])).await?;
        let wei = parse_hex_wei(&raw)?;
        Ok(wei_to_native(wei))
    }

    fn subscribe_account_changes(&self) -> AccountsSubscription {
        AccountsSubscription::new(self.accounts_tx.subscribe())
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

async fn rpc_call<T: DeserializeOwned>(
    http: &Client,
    endpoint: &Url,
    method: &str,
    params: Value,
) -> Result<T, ProviderError> {
    let request = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };
    let response = http.post(endpoint.clone()).json(&request).send().await?;
    let response: RpcResponse<T> = response.json().await?;

    if let Some(err) = response.error {
        if err.code == USER_REJECTED_CODE {
            return Err(ProviderError::Rejected);
        }
        return Err(ProviderError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    response
        .result
        .ok_or_else(|| ProviderError::Parse(format!("{method} returned neither result nor error")))
}

fn parse_hex_wei(raw: &str) -> Result<u128, ProviderError> {
    let digits = raw.trim_start_matches("0x");
    u128::from_str_radix(digits, 16)
        .map_err(|err| ProviderError::Parse(format!("invalid balance {raw:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_wei() {
        // 1 ETH in wei.
        assert_eq!(parse_hex_wei("0xde0b6b3a7640000").unwrap(), 10u128.pow(18));
        assert_eq!(parse_hex_wei("0x0").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage_balance() {
        assert!(parse_hex_wei("not-hex").is_err());
    }

    #[tokio::test]
    async fn unavailable_without_endpoint() {
        let provider = RpcWalletProvider::new(None);
        assert!(!provider.is_available());
        assert!(matches!(
            provider.connected_accounts().await,
            Err(ProviderError::Unavailable)
        ));
        assert!(matches!(
            provider.request_connection().await,
            Err(ProviderError::Unavailable)
        ));
    }
}
