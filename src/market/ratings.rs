use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{MarketData, MarketError};

const PROVIDER: &str = "StockNewsAPI";
const API_URL: &str = "https://stocknewsapi.com/api/v1/ratings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystRating {
    pub analyst_firm: String,
    pub current_rating: String,
    pub previous_price_target: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RatingsResponse {
    #[serde(default)]
    data: Vec<RawRating>,
}

#[derive(Debug, Deserialize)]
struct RawRating {
    #[serde(default)]
    analyst_firm: String,
    #[serde(default)]
    current_rating: String,
    #[serde(default)]
    previous_price_target: Value,
}

/// The provider sends price targets as numbers or numeric strings.
fn price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

pub fn parse_ratings(body: &str) -> Result<Vec<AnalystRating>, MarketError> {
    Ok(collect_ratings(serde_json::from_str(body)?))
}

fn collect_ratings(response: RatingsResponse) -> Vec<AnalystRating> {
    response
        .data
        .into_iter()
        .map(|r| AnalystRating {
            previous_price_target: price(&r.previous_price_target),
            analyst_firm: r.analyst_firm,
            current_rating: r.current_rating,
        })
        .collect()
}

impl MarketData {
    pub async fn ratings(&self, ticker: &str) -> Result<Vec<AnalystRating>, MarketError> {
        let key = Self::key(&self.keys.stocknewsapi, PROVIDER)?;
        let url = Url::parse_with_params(
            API_URL,
            &[("tickers", ticker), ("items", "1"), ("page", "1"), ("token", key)],
        )?;

        Ok(collect_ratings(self.get_json(PROVIDER, url).await?))
    }
}
