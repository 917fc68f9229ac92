use compact_str::CompactString;
use owm_sdk::objects::RiskAlert;
use time::OffsetDateTime;

use super::AlertSeverity;

/// A single observed risk alert.
///
/// Alerts are created by the remote monitoring service and only ever
/// observed by this client; `id` stays stable across polls for as long as
/// the alert remains active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: String,
    pub asset_id: String,
    pub symbol: CompactString,
    pub severity: AlertSeverity,
    pub message: String,
    pub source: String,
    /// When the service raised the alert. Service-assigned, never local time.
    pub raised_at: OffsetDateTime,
    pub url: Option<String>,
    pub chain: Option<String>,
}

impl TryFrom<RiskAlert> for Alert {
    type Error = time::error::ComponentRange;

    fn try_from(raw: RiskAlert) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            asset_id: raw.asset_id,
            symbol: raw.asset_symbol,
            severity: raw.level.into(),
            message: raw.message,
            source: raw.source,
            raised_at: OffsetDateTime::from_unix_timestamp(raw.timestamp)?,
            url: raw.url,
            chain: raw.chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owm_sdk::objects::AlertLevel;

    fn raw(timestamp: i64) -> RiskAlert {
        RiskAlert {
            id: "alert1".to_string(),
            asset_id: "solana".to_string(),
            asset_symbol: "SOL".into(),
            level: AlertLevel::High,
            message: "Network instability reported".to_string(),
            source: "BlockchainMonitor".to_string(),
            timestamp,
            url: None,
            chain: Some("Solana".to_string()),
        }
    }

    #[test]
    fn converts_wire_alert() {
        let alert = Alert::try_from(raw(1_747_000_000)).unwrap();
        assert_eq!(alert.severity, AlertSeverity::High);
        assert_eq!(alert.raised_at.unix_timestamp(), 1_747_000_000);
    }

    #[test]
    fn rejects_out_of_range_timestamp() {
        assert!(Alert::try_from(raw(i64::MAX)).is_err());
    }

    #[test]
    fn severity_is_ordered() {
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }
}
