use serde::{Deserialize, Serialize};

/// Body of `POST /api/query`.
///
/// # JSON Format
/// ```json
/// { "query": "\nTickers to focus on:\nAAPL\n\nAdditional Context:\n...\n\nQuery:\nHow did they do?" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Builds the backend prompt: selected tickers, then session context, then
/// the user's literal question.
pub fn compose_prompt<S: AsRef<str>>(selected: &[S], context: &str, query: &str) -> String {
    let tickers = selected
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "\nTickers to focus on:\n{}\n\nAdditional Context:\n{}\n\nQuery:\n{}",
        tickers, context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = compose_prompt(&["AAPL", "MSFT"], "Focus on earnings.", "How did they do?");

        let tickers = prompt.find("AAPL, MSFT").unwrap();
        let context = prompt.find("Focus on earnings.").unwrap();
        let query = prompt.find("How did they do?").unwrap();
        assert!(prompt.find("Tickers to focus on:").unwrap() < tickers);
        assert!(tickers < context);
        assert!(context < query);
        assert!(prompt.find("Query:").unwrap() < query);
    }

    #[test]
    fn test_empty_selection() {
        let prompt = compose_prompt::<String>(&[], "ctx", "q");
        assert_eq!(prompt, "\nTickers to focus on:\n\n\nAdditional Context:\nctx\n\nQuery:\nq");
    }

    #[test]
    fn test_request_wire_shape() {
        let request: QueryRequest = serde_json::from_str(r#"{"query":"hi"}"#).unwrap();
        assert_eq!(request.query, "hi");
        assert!(serde_json::from_str::<QueryRequest>(r#"{"prompt":"hi"}"#).is_err());
        assert_eq!(
            serde_json::to_string(&QueryResponse {
                response: "ok".to_string()
            })
            .unwrap(),
            r#"{"response":"ok"}"#
        );
    }
}
