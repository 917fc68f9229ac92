//! Alert retrieval capability.
//!
//! [`AlertSource`] is the seam between the synchronizer and the remote
//! monitoring service: given an address it returns the complete current set
//! of active alerts, unordered and unpaginated. Tests substitute in-memory
//! sources; production uses [`HttpAlertSource`] over the SDK client.

use async_trait::async_trait;
use owm_sdk::client::{ClientError, RiskApiClient};
use thiserror::Error;

use crate::entities::alert::Alert;

/// Errors that can occur while fetching alerts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport or remote failure reported by the API client.
    #[error("alert fetch failed: {0}")]
    Client(#[from] ClientError),

    /// The payload decoded but could not be mapped into the domain.
    #[error("malformed alert payload: {0}")]
    Decode(String),
}

/// Capability interface for fetching the active alert set of an address.
#[async_trait]
pub trait AlertSource: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<Vec<Alert>, FetchError>;
}

/// Production alert source backed by the risk-analysis REST API.
pub struct HttpAlertSource {
    client: RiskApiClient,
}

impl HttpAlertSource {
    pub fn new(client: RiskApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlertSource for HttpAlertSource {
    async fn fetch(&self, address: &str) -> Result<Vec<Alert>, FetchError> {
        let raw = self.client.alerts(address).await?;
        raw.into_iter()
            .map(|alert| {
                let id = alert.id.clone();
                Alert::try_from(alert)
                    .map_err(|err| FetchError::Decode(format!("alert {id}: {err}")))
            })
            .collect()
    }
}
