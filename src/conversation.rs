//! Client-side conversation state and the per-turn query dispatch.

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;

use crate::generation::TextGenerator;
use crate::query::{compose_prompt, ErrorResponse, QueryRequest, QueryResponse};
use crate::session::SessionDescriptor;
use crate::tickers;

pub const FAILED_TURN_TEXT: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Resolved,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub status: MessageStatus,
}

impl ChatMessage {
    pub fn pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

/// Index of an assistant placeholder awaiting its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTurn(usize);

/// Append-only, alternating user/assistant message list.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends the user's message and a pending assistant placeholder.
    pub fn begin_turn(&mut self, user_text: &str) -> PendingTurn {
        self.messages.push(ChatMessage {
            role: MessageRole::User,
            content: user_text.to_string(),
            status: MessageStatus::Resolved,
        });
        self.messages.push(ChatMessage {
            role: MessageRole::Assistant,
            content: String::new(),
            status: MessageStatus::Pending,
        });
        PendingTurn(self.messages.len() - 1)
    }

    pub fn resolve(&mut self, turn: PendingTurn, content: String) {
        self.settle(turn, content, MessageStatus::Resolved);
    }

    pub fn fail(&mut self, turn: PendingTurn) {
        self.settle(turn, FAILED_TURN_TEXT.to_string(), MessageStatus::Failed);
    }

    fn settle(&mut self, turn: PendingTurn, content: String, status: MessageStatus) {
        if let Some(message) = self.messages.get_mut(turn.0) {
            if message.pending() {
                message.content = content;
                message.status = status;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("query is empty")]
    EmptyQuery,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Carries a composed prompt to whatever produces the answer.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn send(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Posts prompts to a running server's `/api/query`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: url::Url,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: &str) -> anyhow::Result<Self> {
        let mut base = url::Url::parse(base_url)?;
        // Keep any path prefix the server is mounted under.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base.join("api/query")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn send(&self, prompt: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&QueryRequest {
                query: prompt.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(anyhow!("Query failed ({}): {}", status, message));
        }

        Ok(response.json::<QueryResponse>().await?.response)
    }
}

/// Calls a generator in-process, skipping the HTTP hop.
pub struct GeneratorTransport {
    generator: Arc<dyn TextGenerator>,
}

impl GeneratorTransport {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl QueryTransport for GeneratorTransport {
    async fn send(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.generator.generate(prompt).await?)
    }
}

/// One open space: its session, the ticker selection and the transcript.
pub struct Conversation<T> {
    session: SessionDescriptor,
    selected: Vec<String>,
    transcript: Transcript,
    transport: T,
}

impl<T: QueryTransport> Conversation<T> {
    pub fn new(session: SessionDescriptor, transport: T) -> Self {
        Self {
            session,
            selected: Vec::new(),
            transcript: Transcript::new(),
            transport,
        }
    }

    pub fn session(&self) -> &SessionDescriptor {
        &self.session
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn session_ticker(&self, ticker: &str) -> Option<String> {
        let wanted = tickers::normalize([ticker]).into_iter().next()?;
        self.session
            .tickers
            .iter()
            .find(|t| t.eq_ignore_ascii_case(&wanted))
            .cloned()
    }

    /// Flips a session ticker in or out of the selection. Returns whether it
    /// is selected afterwards; tickers outside the session are ignored.
    pub fn toggle_ticker(&mut self, ticker: &str) -> bool {
        let Some(ticker) = self.session_ticker(ticker) else {
            return false;
        };

        if let Some(pos) = self.selected.iter().position(|t| *t == ticker) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(ticker);
            true
        }
    }

    /// Adds a session ticker to the selection if it is not already there.
    pub fn select_ticker(&mut self, ticker: &str) -> bool {
        let Some(ticker) = self.session_ticker(ticker) else {
            return false;
        };
        if !self.selected.contains(&ticker) {
            self.selected.push(ticker);
        }
        true
    }

    /// Runs one chat turn. The user message and a pending placeholder are
    /// recorded before the prompt is sent; the placeholder is then replaced
    /// with the answer, or marked failed.
    pub async fn submit(&mut self, user_text: &str) -> Result<&ChatMessage, DispatchError> {
        if user_text.trim().is_empty() {
            return Err(DispatchError::EmptyQuery);
        }

        let prompt = compose_prompt(&self.selected, &self.session.context, user_text);
        let turn = self.transcript.begin_turn(user_text);

        match self.transport.send(&prompt).await {
            Ok(response) => {
                self.transcript.resolve(turn, response);
                Ok(&self.transcript.messages[turn.0])
            }
            Err(e) => {
                log::error!("Query failed: {:#}", e);
                self.transcript.fail(turn);
                Err(DispatchError::Backend(e))
            }
        }
    }
}
