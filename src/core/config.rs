use anyhow::{anyhow, Result};
use std::net::SocketAddr;

use crate::generation::config::DEFAULT_MODEL;
use crate::market::MarketKeys;

/// How the server reaches Gemini.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeminiCredentials {
    ApiKey(String),
    ServiceAccount(String),
}

#[derive(Clone, Debug)]
pub struct YiqiConfig {
    pub credentials: GeminiCredentials,
    pub project: String,
    pub location: String,
    pub model: String,
    pub bind_addr: SocketAddr,
    pub market: MarketKeys,
}

impl YiqiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let credentials = match (var("GEMINI_API_KEY"), var("GOOGLE_APPLICATION_CREDENTIALS_JSON")) {
            (Some(key), _) => GeminiCredentials::ApiKey(key),
            (None, Some(json)) => GeminiCredentials::ServiceAccount(json),
            (None, None) => {
                return Err(anyhow!(
                    "Neither GEMINI_API_KEY nor GOOGLE_APPLICATION_CREDENTIALS_JSON environment variable is set"
                ))
            }
        };

        let bind_addr = var("YIQI_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|e| anyhow!("Invalid YIQI_BIND_ADDR: {}", e))?;

        Ok(Self {
            credentials,
            project: var("GOOGLE_CLOUD_PROJECT").unwrap_or_else(|| "yiqiai".to_string()),
            location: var("GOOGLE_CLOUD_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_addr,
            market: MarketKeys {
                alphavantage: var("ALPHAVANTAGE_API_KEY"),
                polygon: var("POLYGON_API_KEY"),
                stocknewsapi: var("STOCKNEWSAPI_KEY"),
                fmp: var("FMP_API_KEY"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<YiqiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        YiqiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_requires_credentials() {
        assert!(config(&[]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("GOOGLE_APPLICATION_CREDENTIALS_JSON", "{}")]).unwrap();
        assert_eq!(cfg.credentials, GeminiCredentials::ServiceAccount("{}".to_string()));
        assert_eq!(cfg.project, "yiqiai");
        assert_eq!(cfg.location, "us-central1");
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert!(cfg.market.polygon.is_none());
    }

    #[test]
    fn test_api_key_takes_precedence() {
        let cfg = config(&[
            ("GEMINI_API_KEY", "key"),
            ("GOOGLE_APPLICATION_CREDENTIALS_JSON", "{}"),
            ("YIQI_BIND_ADDR", "0.0.0.0:8080"),
            ("POLYGON_API_KEY", "poly"),
        ])
        .unwrap();
        assert_eq!(cfg.credentials, GeminiCredentials::ApiKey("key".to_string()));
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.market.polygon.as_deref(), Some("poly"));
    }

    #[test]
    fn test_invalid_bind_addr() {
        assert!(config(&[("GEMINI_API_KEY", "k"), ("YIQI_BIND_ADDR", "nope")]).is_err());
    }
}
