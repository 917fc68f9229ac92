use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Severity of a risk alert as reported by the service.
///
/// Ordering is ordinal only; the service derives it from a 0–100 risk score
/// but the wire carries just the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    High,
    Medium,
    Low,
}

/// A single risk notice about an asset, scoped to a wallet address.
///
/// `GET /api/v1/alerts/{address}` returns the complete current set of
/// active alerts for the address, unordered and unpaginated. `id` is stable
/// across polls for as long as the alert stays active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub id: String,
    pub asset_id: String,
    pub asset_symbol: CompactString,
    pub level: AlertLevel,
    pub message: String,
    pub source: String,
    /// Unix seconds, assigned by the monitoring service.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Originating blockchain network, when the alert is chain-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// Response of `GET /api/v1/risk-score/{address}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreResponse {
    /// Aggregate wallet risk score in `[0, 100]`.
    pub risk_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_round_trips_service_json() {
        let json = r#"{
            "id": "alert1",
            "assetId": "solana",
            "assetSymbol": "SOL",
            "level": "high",
            "message": "Network instability reported",
            "source": "BlockchainMonitor",
            "timestamp": 1747000000,
            "url": "https://example.com/solana-outage",
            "chain": "Solana"
        }"#;
        let alert: RiskAlert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.asset_symbol, "SOL");
        assert_eq!(alert.level, AlertLevel::High);
        assert_eq!(alert.chain.as_deref(), Some("Solana"));

        let back = serde_json::to_value(&alert).unwrap();
        assert_eq!(back["assetSymbol"], "SOL");
        assert_eq!(back["level"], "high");
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let json = r#"{
            "id": "alert2",
            "assetId": "ethereum",
            "assetSymbol": "ETH",
            "level": "medium",
            "message": "Potential regulatory concerns",
            "source": "Regulatory Watch",
            "timestamp": 1747000000
        }"#;
        let alert: RiskAlert = serde_json::from_str(json).unwrap();
        assert!(alert.url.is_none());
        assert!(alert.chain.is_none());
    }
}
