use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::generation::TextGenerator;
use crate::market::{AnalystRating, MarketData, MarketError, Metric, NewsArticle, SymbolMatch};
use crate::query::{ErrorResponse, QueryRequest, QueryResponse};
use crate::session::{self, SessionDescriptor};
use crate::tickers::Ticker;

const NEWS_LIMIT: usize = 1;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn market_error(e: MarketError) -> ApiError {
    log::error!("Market data lookup failed: {}", e);
    match e {
        MarketError::MissingApiKey(_) => api_error(StatusCode::SERVICE_UNAVAILABLE, e),
        _ => api_error(StatusCode::BAD_GATEWAY, e),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub market: Arc<MarketData>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSpaceRequest {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSpaceResponse {
    pub token: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<QueryResponse> {
    let Json(request) =
        body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    if request.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query must not be empty"));
    }

    let response = state.generator.generate(&request.query).await.map_err(|e| {
        log::error!("Generation failed: {}", e);
        api_error(StatusCode::BAD_GATEWAY, e)
    })?;

    Ok(Json(QueryResponse { response }))
}

async fn create_space(
    body: Result<Json<CreateSpaceRequest>, JsonRejection>,
) -> ApiResult<CreateSpaceResponse> {
    let Json(request) =
        body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let tickers = request
        .tickers
        .iter()
        .map(Ticker::new)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let descriptor = SessionDescriptor::normalized(tickers, request.context);
    let token = session::encode(&descriptor);
    let path = session::view_path(&token);

    Ok(Json(CreateSpaceResponse { token, path }))
}

async fn view_space(Path(token): Path<String>) -> ApiResult<SessionDescriptor> {
    session::decode(&token).map(Json).map_err(|e| {
        log::debug!("Rejected space token: {}", e);
        api_error(StatusCode::NOT_FOUND, "space not found")
    })
}

async fn view_space_without_token() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "space not found")
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<SymbolMatch>> {
    if params.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query must not be empty"));
    }
    state
        .market
        .search(params.query.trim())
        .await
        .map(Json)
        .map_err(market_error)
}

fn path_ticker(ticker: &str) -> Result<Ticker, ApiError> {
    Ticker::new(ticker).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))
}

async fn overview(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Vec<Metric>> {
    let ticker = path_ticker(&ticker)?;
    state
        .market
        .overview(ticker.as_str())
        .await
        .map(Json)
        .map_err(market_error)
}

async fn news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Vec<NewsArticle>> {
    let ticker = path_ticker(&ticker)?;
    state
        .market
        .news(ticker.as_str(), NEWS_LIMIT)
        .await
        .map(Json)
        .map_err(market_error)
}

async fn ratings(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Vec<AnalystRating>> {
    let ticker = path_ticker(&ticker)?;
    state
        .market
        .ratings(ticker.as_str())
        .await
        .map(Json)
        .map_err(market_error)
}

async fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not found")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/query", post(query))
        .route("/api/spaces", post(create_space))
        .route("/api/search", get(search))
        .route("/api/overview/:ticker", get(overview))
        .route("/api/news/:ticker", get(news))
        .route("/api/ratings/:ticker", get(ratings))
        .route("/spaces/view", get(view_space_without_token))
        .route("/spaces/:token/view", get(view_space))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
