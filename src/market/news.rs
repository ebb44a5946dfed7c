use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{MarketData, MarketError};

const PROVIDER: &str = "Polygon";
const API_URL: &str = "https://api.polygon.io/v2/reference/news";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub author: String,
    pub logo: Option<String>,
    pub url: String,
    pub published_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    #[serde(default)]
    favicon_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: String,
    #[serde(default)]
    author: String,
    article_url: String,
    publisher: Publisher,
    #[serde(default)]
    published_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    results: Vec<RawArticle>,
}

pub fn parse_news(body: &str) -> Result<Vec<NewsArticle>, MarketError> {
    articles(serde_json::from_str(body)?)
}

fn articles(response: NewsResponse) -> Result<Vec<NewsArticle>, MarketError> {
    if response.status != "OK" {
        return Err(MarketError::Upstream(format!(
            "{} returned status {}",
            PROVIDER, response.status
        )));
    }

    Ok(response
        .results
        .into_iter()
        .map(|a| NewsArticle {
            title: a.title,
            author: a.author,
            logo: a.publisher.favicon_url,
            url: a.article_url,
            published_utc: a.published_utc,
        })
        .collect())
}

impl MarketData {
    pub async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>, MarketError> {
        let key = Self::key(&self.keys.polygon, PROVIDER)?;
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            API_URL,
            &[
                ("ticker", ticker),
                ("order", "asc"),
                ("limit", limit.as_str()),
                ("sort", "published_utc"),
                ("apiKey", key),
            ],
        )?;

        articles(self.get_json(PROVIDER, url).await?)
    }
}
