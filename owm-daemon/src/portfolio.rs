//! One-shot portfolio summary.
//!
//! On every (re)connect the daemon logs a snapshot of the wallet's
//! cross-chain holdings and aggregate risk, classified with the same
//! severity buckets used for alerts.

use owm_core::utils::severity::severity_for_score;
use owm_sdk::client::RiskApiClient;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::render::short_address;

/// Fetch and log the wallet's holdings and risk score. Best-effort: every
/// failure degrades to a warning, never an error.
pub async fn log_snapshot(client: RiskApiClient, address: String) {
    match client.assets(&address).await {
        Ok(assets) => {
            for asset in &assets {
                info!(
                    symbol = %asset.symbol,
                    chain = asset.chain.as_deref().unwrap_or("Unknown"),
                    amount = %asset.amount,
                    value_usd = %asset.value,
                    change_24h = asset.change_24h,
                    risk = %severity_for_score(asset.risk_score),
                    "holding"
                );
            }
            let total: Decimal = assets.iter().map(|asset| asset.value).sum();
            info!(
                address = %short_address(&address),
                assets = assets.len(),
                total_value_usd = %total,
                "portfolio snapshot"
            );

            let ids: Vec<&str> = assets.iter().map(|asset| asset.id.as_str()).collect();
            if !ids.is_empty() {
                match client.sentiment(&ids).await {
                    Ok(sentiment) => {
                        for asset in &assets {
                            if let Some(data) = sentiment.get(&asset.id) {
                                info!(
                                    symbol = %asset.symbol,
                                    positive = data.positive,
                                    negative = data.negative,
                                    neutral = data.neutral,
                                    overall = ?data.overall,
                                    "sentiment"
                                );
                            }
                        }
                    }
                    Err(err) => warn!(error = %err, "sentiment query failed"),
                }
            }
        }
        Err(err) => warn!(error = %err, "asset query failed"),
    }

    match client.risk_score(&address).await {
        Ok(response) => info!(
            score = response.risk_score,
            severity = %severity_for_score(response.risk_score),
            "wallet risk score"
        ),
        Err(err) => warn!(error = %err, "risk score query failed"),
    }
}
