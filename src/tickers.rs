use anyhow::{anyhow, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid ticker label regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(ticker: impl AsRef<str>) -> Result<Self> {
        let raw = ticker.as_ref();
        let uppercase_ticker = raw.trim().to_uppercase();
        if uppercase_ticker.is_empty() {
            return Err(anyhow!("Ticker cannot be empty"));
        }
        if !uppercase_ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(anyhow!(
                "Ticker must contain only alphanumeric characters, dots or hyphens: {}",
                raw
            ));
        }
        Ok(Ticker(uppercase_ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uppercases, trims and de-duplicates ticker symbols, keeping first-seen order.
/// Blank entries are dropped.
pub fn normalize<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tickers
        .into_iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .unique()
        .collect()
}

/// Extracts the symbol from an autocomplete label such as `Apple Inc. (AAPL)`.
/// Labels without parentheses are taken as the symbol itself.
pub fn symbol_from_label(label: &str) -> Result<Ticker> {
    let symbol = LABEL_SYMBOL
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(label);
    Ticker::new(symbol)
}

/// Splits a comma separated list such as `aapl, msft` and normalizes it.
pub fn parse_list(input: &str) -> Result<Vec<String>> {
    let tickers = input
        .split(',')
        .filter(|t| !t.trim().is_empty())
        .map(Ticker::new)
        .collect::<Result<Vec<_>>>()?;
    Ok(normalize(tickers))
}
