use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset position in a wallet, as returned by
/// `GET /api/v1/assets/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: CompactString,
    pub name: String,
    /// Logo URL for display.
    pub image: String,
    pub amount: Decimal,
    /// Position value in USD.
    pub value: Decimal,
    pub price_usd: Decimal,
    /// 24h price change in percent.
    pub change_24h: f64,
    /// Asset risk score in `[0, 100]`.
    pub risk_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// Aggregate sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Sentiment distribution for one asset, from
/// `GET /api/v1/sentiment?asset=…`.
///
/// The three percentages are service-computed and are not required to sum
/// to exactly 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentData {
    pub positive: u8,
    pub negative: u8,
    pub neutral: u8,
    pub overall: SentimentLabel,
}

/// A news article contributing to an asset's sentiment, from
/// `GET /api/v1/news/{asset_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSource {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub sentiment: SentimentLabel,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_parses_service_json() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "BTC",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "amount": "0.5",
            "value": "16235.50",
            "priceUsd": "32471.00",
            "change24h": 2.3,
            "riskScore": 25,
            "chain": "Bitcoin"
        }"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.symbol, "BTC");
        assert_eq!(asset.price_usd, Decimal::new(3247100, 2));
        assert_eq!(asset.risk_score, 25.0);
    }

    #[test]
    fn sentiment_label_uses_lowercase() {
        let data: SentimentData = serde_json::from_str(
            r#"{"positive": 65, "negative": 15, "neutral": 20, "overall": "positive"}"#,
        )
        .unwrap();
        assert_eq!(data.overall, SentimentLabel::Positive);
    }
}
