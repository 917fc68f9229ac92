//! TOML file configuration structures.
//!
//! These structs directly map to the `owm-config.toml` file format.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Wallet bridge section. Absent means no wallet provider is present.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Risk-analysis API section.
    #[serde(default)]
    pub api: ApiConfig,
    /// Monitoring cadence tuning.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Wallet bridge configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// JSON-RPC endpoint of the local wallet bridge. Leaving this unset
    /// models "no wallet extension installed".
    #[serde(default)]
    pub endpoint: Option<Url>,
}

/// Risk-analysis API configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the risk-analysis service.
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Optional API key, sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Monitoring cadence section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between alert polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds between bridge account polls.
    #[serde(default = "default_accounts_poll_secs")]
    pub accounts_poll_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    owm_core::processors::DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_accounts_poll_secs() -> u64 {
    owm_core::provider::rpc::DEFAULT_ACCOUNTS_POLL.as_secs()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            accounts_poll_secs: default_accounts_poll_secs(),
        }
    }
}
