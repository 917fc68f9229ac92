pub mod alert;
pub mod session;

use owm_sdk::objects::AlertLevel;

/// Alert severity for domain operations.
///
/// Ordered `Low < Medium < High` so severities can be compared directly.
/// For API/DTO use, see `owm_sdk::objects::AlertLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl From<AlertSeverity> for AlertLevel {
    fn from(value: AlertSeverity) -> Self {
        match value {
            AlertSeverity::Low => AlertLevel::Low,
            AlertSeverity::Medium => AlertLevel::Medium,
            AlertSeverity::High => AlertLevel::High,
        }
    }
}

impl From<AlertLevel> for AlertSeverity {
    fn from(value: AlertLevel) -> Self {
        match value {
            AlertLevel::Low => AlertSeverity::Low,
            AlertLevel::Medium => AlertSeverity::Medium,
            AlertLevel::High => AlertSeverity::High,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "low"),
            AlertSeverity::Medium => write!(f, "medium"),
            AlertSeverity::High => write!(f, "high"),
        }
    }
}
