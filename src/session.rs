use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tickers;

/// The `{tickers, context}` record behind a shareable space link.
///
/// # JSON Format
/// ```json
/// {
///   "tickers": ["AAPL", "MSFT"],
///   "context": "Focus on earnings."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub tickers: Vec<String>,
    pub context: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token: {0}")]
    MalformedSessionToken(String),
}

impl SessionDescriptor {
    pub fn new(tickers: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            tickers,
            context: context.into(),
        }
    }

    /// Builds a descriptor with the ticker list uppercased and de-duplicated.
    pub fn normalized<I, S>(tickers: I, context: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tickers: tickers::normalize(tickers),
            context: context.into(),
        }
    }
}

/// Encodes a descriptor as base64url (no padding) over its JSON form.
pub fn encode(descriptor: &SessionDescriptor) -> String {
    // Serializing a struct of a string list and a string cannot fail.
    let json = serde_json::to_string(descriptor).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

pub fn decode(token: &str) -> Result<SessionDescriptor, SessionError> {
    let token = token.trim_end_matches('=');
    if token.is_empty() {
        return Err(SessionError::MalformedSessionToken("empty token".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| SessionError::MalformedSessionToken(e.to_string()))?;

    let json = String::from_utf8(bytes)
        .map_err(|e| SessionError::MalformedSessionToken(e.to_string()))?;

    let value: Value =
        serde_json::from_str(&json).map_err(|e| SessionError::MalformedSessionToken(e.to_string()))?;

    // serde would also accept the sequence form `[tickers, context]`.
    if !value.is_object() {
        return Err(SessionError::MalformedSessionToken(
            "expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| SessionError::MalformedSessionToken(e.to_string()))
}

/// An absent token is treated exactly like a malformed one.
pub fn decode_optional(token: Option<&str>) -> Result<SessionDescriptor, SessionError> {
    match token {
        Some(token) => decode(token),
        None => Err(SessionError::MalformedSessionToken("missing token".to_string())),
    }
}

pub fn view_path(token: &str) -> String {
    format!("/spaces/{}/view", token)
}
