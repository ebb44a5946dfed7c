use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::TokenProvider;
use super::config::{GenerationConfig, SafetySetting, SamplingConfig};
use super::{sse, FragmentStream, GenerationError, TextGenerator};

const VERTEX_HOST_SUFFIX: &str = "aiplatform.googleapis.com";
const GENERATIVE_LANGUAGE_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Where requests go and how they authenticate.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// Vertex AI, authenticated with a service-account bearer token.
    Vertex {
        project: String,
        location: String,
        tokens: Arc<TokenProvider>,
    },
    /// The Generative Language API, authenticated with an API key.
    ApiKey { key: String, base_url: String },
}

impl Endpoint {
    /// The public Generative Language API.
    pub fn api_key(key: impl Into<String>) -> Self {
        Endpoint::ApiKey {
            key: key.into(),
            base_url: GENERATIVE_LANGUAGE_BASE.to_string(),
        }
    }

    pub fn stream_url(&self, model: &str) -> String {
        match self {
            Endpoint::Vertex {
                project, location, ..
            } => format!(
                "https://{location}-{VERTEX_HOST_SUFFIX}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:streamGenerateContent?alt=sse"
            ),
            Endpoint::ApiKey { base_url, .. } => format!(
                "{}/models/{model}:streamGenerateContent?alt=sse",
                base_url.trim_end_matches('/')
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: &'a SamplingConfig,
    safety_settings: &'a [SafetySetting],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn new(prompt: &str, config: &'a GenerationConfig) -> Self {
        let tools = if config.google_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(config.system_instruction.clone()),
                }],
            },
            generation_config: &config.sampling,
            safety_settings: &config.safety_settings,
            tools,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// One `data:` payload of a `streamGenerateContent` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

/// Extracts the text carried by one event payload. `Ok(None)` means the chunk
/// carried no text (usage or grounding metadata only).
pub fn chunk_text(data: &str) -> Result<Option<String>, GenerationError> {
    let chunk: StreamChunk = serde_json::from_str(data)?;

    if let Some(error) = chunk.error {
        return Err(GenerationError::Upstream(match error.code {
            Some(code) => format!("{} ({})", error.message, code),
            None => error.message,
        }));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Blocked(reason));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

/// Client for a hosted Gemini model. Build one at startup and share it.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Endpoint,
    model: String,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(http: Client, endpoint: Endpoint, model: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            model: model.into(),
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn stream(&self, prompt: &str) -> Result<FragmentStream, GenerationError> {
        let url = self.endpoint.stream_url(&self.model);
        let body = GenerateContentRequest::new(prompt, &self.config);

        log::debug!("Gemini request URL: {}", url);
        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, mime::TEXT_EVENT_STREAM.as_ref())
            .json(&body);

        request = match &self.endpoint {
            Endpoint::Vertex { tokens, .. } => {
                let token = tokens.access_token(&self.http).await?;
                request.bearer_auth(token)
            }
            Endpoint::ApiKey { key, .. } => request.header(API_KEY_HEADER, key),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Gemini returned {}: {}", status, body);
            return Err(GenerationError::Status { status, body });
        }

        let fragments = sse::events(response.bytes_stream()).filter_map(|event| async move {
            match event {
                Ok(data) => chunk_text(&data).transpose(),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(fragments.boxed())
    }
}
