//! JSON wire objects for the risk-analysis API.
//!
//! Field names follow the service's camelCase convention; timestamps are
//! unix seconds assigned by the service, never by the client.

pub mod market;
pub mod risk;

pub use market::{Asset, NewsSource, SentimentData, SentimentLabel};
pub use risk::{AlertLevel, RiskAlert, RiskScoreResponse};
