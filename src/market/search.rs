use serde::{Deserialize, Serialize};
use url::Url;

use super::{MarketData, MarketError};

const PROVIDER: &str = "Financial Modeling Prep";
const API_URL: &str = "https://financialmodelingprep.com/stable/search-name";

/// An autocomplete candidate for a partial company name or symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub name: String,
    pub symbol: String,
}

impl SymbolMatch {
    /// `Apple Inc. (AAPL)`, the form `tickers::symbol_from_label` reads back.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

impl MarketData {
    pub async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        let key = Self::key(&self.keys.fmp, PROVIDER)?;
        let url = Url::parse_with_params(API_URL, &[("query", query), ("apikey", key)])?;
        self.get_json(PROVIDER, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickers::symbol_from_label;

    #[test]
    fn test_parse_results_and_label() {
        let matches: Vec<SymbolMatch> = serde_json::from_str(
            r#"[
                {"symbol":"AAPL","name":"Apple Inc.","currency":"USD","exchange":"NASDAQ"},
                {"symbol":"APLE","name":"Apple Hospitality REIT, Inc.","currency":"USD"}
            ]"#,
        )
        .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].label(), "Apple Inc. (AAPL)");
        assert_eq!(symbol_from_label(&matches[1].label()).unwrap().as_str(), "APLE");
    }
}
