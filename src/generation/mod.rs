//! Text generation backed by a hosted Gemini model.
//!
//! A [`TextGenerator`] produces a finite, order-preserving stream of text
//! fragments. [`TextGenerator::generate`] folds that stream into a single
//! string, stripping citation markers from every fragment on the way.

pub mod auth;
pub mod config;
pub mod gemini;
pub mod sanitize;
pub mod sse;

pub use config::GenerationConfig;
pub use gemini::{Endpoint, GeminiClient};
pub use sanitize::strip_citations;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

pub type FragmentStream = BoxStream<'static, Result<String, GenerationError>>;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to generation backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response from generation backend: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("generation backend error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Starts a generation and returns its fragments as they arrive.
    async fn stream(&self, prompt: &str) -> Result<FragmentStream, GenerationError>;

    /// Runs a generation to completion and returns the sanitized text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let stream = self.stream(prompt).await?;
        collect_sanitized(stream).await
    }
}

/// Consumes fragments in order, sanitizing each independently.
pub async fn collect_sanitized(mut stream: FragmentStream) -> Result<String, GenerationError> {
    let mut content = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        log::debug!("fragment: {}", fragment);
        content.push_str(&strip_citations(&fragment));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct Scripted(Vec<Result<&'static str, &'static str>>);

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn stream(&self, _prompt: &str) -> Result<FragmentStream, GenerationError> {
            let items: Vec<Result<String, GenerationError>> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.to_string()),
                    Err(e) => Err(GenerationError::Upstream(e.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn test_generate_concatenates_sanitized_fragments() {
        let generator = Scripted(vec![Ok("Revenue grew 12%[1, 2]"), Ok(" last quarter[3]"), Ok(".")]);
        let text = generator.generate("q").await.unwrap();
        assert_eq!(text, "Revenue grew 12% last quarter.");
    }

    #[tokio::test]
    async fn test_citation_split_across_fragments_is_kept() {
        let generator = Scripted(vec![Ok("see [1"), Ok("] here")]);
        assert_eq!(generator.generate("q").await.unwrap(), "see [1] here");
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let generator = Scripted(vec![Ok("partial"), Err("quota exceeded")]);
        let err = generator.generate("q").await.unwrap_err();
        assert!(matches!(err, GenerationError::Upstream(msg) if msg == "quota exceeded"));
    }
}
