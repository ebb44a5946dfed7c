use anyhow::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::config::{GeminiCredentials, YiqiConfig};
use crate::generation::auth::{ServiceAccountKey, TokenProvider};
use crate::generation::{Endpoint, GeminiClient};
use crate::market::MarketData;

pub const USER_AGENT: &str = concat!("yiqi/", env!("CARGO_PKG_VERSION"));

pub fn initialize_http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Builds the process-wide Gemini client.
pub fn initialize_gemini(config: &YiqiConfig, http: Client) -> Result<Arc<GeminiClient>> {
    let endpoint = match &config.credentials {
        GeminiCredentials::ApiKey(key) => Endpoint::api_key(key.clone()),
        GeminiCredentials::ServiceAccount(json) => {
            let key = ServiceAccountKey::from_json(json)?;
            log::info!("Using Vertex AI as {}", key.client_email);
            Endpoint::Vertex {
                project: config.project.clone(),
                location: config.location.clone(),
                tokens: Arc::new(TokenProvider::new(key)),
            }
        }
    };

    log::info!("Gemini model: {}", config.model);
    Ok(Arc::new(GeminiClient::new(http, endpoint, config.model.clone())))
}

pub fn initialize_market_data(config: &YiqiConfig, http: Client) -> Arc<MarketData> {
    Arc::new(MarketData::new(http, config.market.clone()))
}
