//! Typed client for the risk-analysis REST API.

use std::collections::HashMap;

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::market::{Asset, NewsSource, SentimentData};
use crate::objects::risk::{RiskAlert, RiskScoreResponse};

/// Header carrying the optional service API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Typed HTTP client for the risk-analysis service.
///
/// All endpoints are plain GETs; authentication, when configured, is a
/// static API key sent as the `X-Api-Key` header on every request.
#[derive(Debug, Clone)]
pub struct RiskApiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RiskApiClient {
    /// Create a new `RiskApiClient`.
    ///
    /// * `base_url` – root URL of the risk-analysis service.
    /// * `api_key` – optional API key for authenticated deployments.
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/alerts/{address}` – the complete current set of active
    /// risk alerts for a wallet address.
    pub async fn alerts(&self, address: &str) -> Result<Vec<RiskAlert>, ClientError> {
        let url = self.base_url.join(&format!("/api/v1/alerts/{address}"))?;
        let resp = self.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/assets/{address}` – the wallet's cross-chain asset
    /// holdings.
    pub async fn assets(&self, address: &str) -> Result<Vec<Asset>, ClientError> {
        let url = self.base_url.join(&format!("/api/v1/assets/{address}"))?;
        let resp = self.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/sentiment?asset=…&asset=…` – sentiment distributions
    /// keyed by asset id.
    pub async fn sentiment(
        &self,
        asset_ids: &[&str],
    ) -> Result<HashMap<String, SentimentData>, ClientError> {
        let url = self.base_url.join("/api/v1/sentiment")?;
        let query: Vec<(&str, &str)> = asset_ids.iter().map(|id| ("asset", *id)).collect();
        let resp = self.get(url).query(&query).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/news/{asset_id}` – news articles behind an asset's
    /// sentiment.
    pub async fn news(&self, asset_id: &str) -> Result<Vec<NewsSource>, ClientError> {
        let url = self.base_url.join(&format!("/api/v1/news/{asset_id}"))?;
        let resp = self.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/risk-score/{address}` – aggregate wallet risk score.
    pub async fn risk_score(&self, address: &str) -> Result<RiskScoreResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/risk-score/{address}"))?;
        let resp = self.get(url).send().await?;
        parse_response(resp).await
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
