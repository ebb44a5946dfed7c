use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use yiqi::generation::{FragmentStream, GenerationError, TextGenerator};
use yiqi::market::MarketData;
use yiqi::server::{router, AppState};
use yiqi::session::{self, SessionDescriptor};

#[derive(Default)]
struct FakeGenerator {
    fragments: Vec<&'static str>,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn stream(&self, prompt: &str) -> Result<FragmentStream, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(GenerationError::Upstream("quota exhausted".to_string()));
        }
        let fragments: Vec<Result<String, GenerationError>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        Ok(stream::iter(fragments).boxed())
    }
}

fn app(generator: Arc<FakeGenerator>) -> Router {
    router(AppState {
        generator,
        market: Arc::new(MarketData::new(reqwest::Client::new(), Default::default())),
    })
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_query_returns_sanitized_text() {
    let generator = Arc::new(FakeGenerator {
        fragments: vec!["Apple reported strong earnings [1]", ", beating estimates [2, 3]."],
        ..Default::default()
    });

    let (status, body) = send(
        app(generator.clone()),
        post_json("/api/query", r#"{"query":"How did Apple do?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"response": "Apple reported strong earnings , beating estimates ."})
    );
    assert_eq!(*generator.prompts.lock().unwrap(), vec!["How did Apple do?".to_string()]);
}

#[tokio::test]
async fn test_query_rejects_bad_bodies() {
    for body in [r#"{}"#, r#"{"query":"   "}"#, "not json"] {
        let generator = Arc::new(FakeGenerator::default());
        let (status, response) = send(app(generator.clone()), post_json("/api/query", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert!(response["error"].is_string());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_query_generation_failure() {
    let generator = Arc::new(FakeGenerator {
        fail: true,
        ..Default::default()
    });

    let (status, body) = send(app(generator), post_json("/api/query", r#"{"query":"hi"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("quota exhausted"));
}

#[tokio::test]
async fn test_create_space_normalizes_tickers() {
    let (status, body) = send(
        app(Arc::default()),
        post_json(
            "/api/spaces",
            r#"{"tickers":["aapl"," msft","AAPL"],"context":"Compare margins"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(body["path"], json!(format!("/spaces/{}/view", token)));
    assert_eq!(
        session::decode(token).unwrap(),
        SessionDescriptor::new(vec!["AAPL".into(), "MSFT".into()], "Compare margins")
    );
}

#[tokio::test]
async fn test_create_space_rejects_invalid_ticker() {
    let (status, _) = send(
        app(Arc::default()),
        post_json("/api/spaces", r#"{"tickers":["AA PL!"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_space() {
    let descriptor = SessionDescriptor::new(vec!["TSLA".into()], "Be concise.");
    let token = session::encode(&descriptor);

    let (status, body) = send(app(Arc::default()), get(&session::view_path(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"tickers": ["TSLA"], "context": "Be concise."}));

    let (status, body) = send(app(Arc::default()), get("/spaces/bm90IGpzb24/view")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "space not found"}));

    let (status, _) = send(app(Arc::default()), get("/spaces/view")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_market_routes_without_keys() {
    for uri in ["/api/overview/AAPL", "/api/news/AAPL", "/api/ratings/AAPL", "/api/search?query=apple"] {
        let (status, body) = send(app(Arc::default()), get(uri)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "uri: {}", uri);
        assert!(body["error"].is_string());
    }

    let (status, _) = send(app(Arc::default()), get("/api/search?query=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_fallback() {
    let (status, _) = send(app(Arc::default()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(app(Arc::default()), get("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
