use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use super::{MarketData, MarketError};

const PROVIDER: &str = "Alpha Vantage";
const API_URL: &str = "https://www.alphavantage.co/query";

/// Metrics shown for each ticker, in display order.
pub const OVERVIEW_METRICS: [&str; 10] = [
    "Market Capitalization",
    "EPS",
    "PE Ratio",
    "Forward PE",
    "Dividend Yield",
    "Revenue TTM",
    "Profit Margin",
    "Analyst Target Price",
    "Beta",
    "Quarterly Earnings Growth YOY",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
}

/// Picks the display metrics out of a raw `OVERVIEW` payload. Provider keys
/// are the metric names without spaces; absent or empty values are skipped.
pub fn select_metrics(raw: &HashMap<String, Value>) -> Vec<Metric> {
    OVERVIEW_METRICS
        .iter()
        .filter_map(|name| {
            let value = match raw.get(&name.replace(' ', ""))? {
                Value::String(s) => s.clone(),
                Value::Null => return None,
                other => other.to_string(),
            };
            if value.is_empty() {
                return None;
            }
            Some(Metric {
                name: name.to_string(),
                value,
            })
        })
        .collect()
}

impl MarketData {
    pub async fn overview(&self, ticker: &str) -> Result<Vec<Metric>, MarketError> {
        let key = Self::key(&self.keys.alphavantage, PROVIDER)?;
        let url = Url::parse_with_params(
            API_URL,
            &[("function", "OVERVIEW"), ("symbol", ticker), ("apikey", key)],
        )?;

        let raw: HashMap<String, Value> = self.get_json(PROVIDER, url).await?;
        if let Some(Value::String(note)) = raw.get("Note").or_else(|| raw.get("Information")) {
            return Err(MarketError::Upstream(note.clone()));
        }

        Ok(select_metrics(&raw))
    }
}
