//! Read-only lookups against third-party market data services.
//!
//! Nothing here retries or caches; every call goes straight to the provider.

pub mod news;
pub mod overview;
pub mod ratings;
pub mod search;

pub use news::NewsArticle;
pub use overview::Metric;
pub use ratings::AnalystRating;
pub use search::SymbolMatch;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{provider} returned {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("{0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Default)]
pub struct MarketKeys {
    pub alphavantage: Option<String>,
    pub polygon: Option<String>,
    pub stocknewsapi: Option<String>,
    pub fmp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MarketData {
    client: Client,
    keys: MarketKeys,
}

impl MarketData {
    pub fn new(client: Client, keys: MarketKeys) -> Self {
        Self { client, keys }
    }

    fn key<'a>(key: &'a Option<String>, provider: &'static str) -> Result<&'a str, MarketError> {
        key.as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(MarketError::MissingApiKey(provider))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        provider: &'static str,
        url: Url,
    ) -> Result<T, MarketError> {
        log::debug!("{} request: {}{}", provider, url.host_str().unwrap_or_default(), url.path());

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("{} returned {}", provider, status);
            return Err(MarketError::Status { provider, status });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
