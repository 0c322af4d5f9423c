//! Route registration: the search and community forwards plus system endpoints.

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use subsearch_client::UpstreamClient;
use subsearch_types::{SearchOptions, SearchQuery};
use tracing::{error, info};

use crate::error::{RelayError, ABOUT_FAILED, MISSING_PARAMS, SEARCH_FAILED};

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
}

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/subreddit/{name}", get(about))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(state)
        .layer(middleware::from_fn(cors))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    subreddit: Option<String>,
    keyword: Option<String>,
    sort: Option<String>,
    time: Option<String>,
    limit: Option<String>,
}

impl SearchParams {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(
            self.subreddit.clone().unwrap_or_default(),
            self.keyword.clone().unwrap_or_default(),
        )
    }

    fn options(&self) -> Result<SearchOptions, RelayError> {
        let mut options = SearchOptions::default();
        if let Some(sort) = non_empty(&self.sort) {
            options.sort = sort.parse().map_err(RelayError::BadRequest)?;
        }
        if let Some(time) = non_empty(&self.time) {
            options.time = time.parse().map_err(RelayError::BadRequest)?;
        }
        if let Some(limit) = non_empty(&self.limit) {
            options.limit = limit
                .trim()
                .parse()
                .map_err(|_| RelayError::BadRequest(format!("invalid limit '{}'", limit)))?;
        }
        Ok(options)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, RelayError> {
    let query = params.query();
    if !query.is_executable() {
        return Err(RelayError::BadRequest(MISSING_PARAMS.to_string()));
    }
    let options = params.options()?;

    info!("search {} sort={} t={} limit={}", query, options.sort, options.time, options.effective_limit());
    let listing = state.upstream.search_raw(&query, &options).await.map_err(|e| {
        error!("search error: {}", e);
        RelayError::from_api(e, SEARCH_FAILED)
    })?;
    Ok(Json(listing))
}

async fn about(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, RelayError> {
    info!("subreddit info r/{}", name);
    let body = state.upstream.about(&name).await.map_err(|e| {
        error!("subreddit info error: {}", e);
        RelayError::from_api(e, ABOUT_FAILED)
    })?;
    Ok(Json(body))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "subsearch-relayd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Permissive CORS: any origin, preflights answered here with 204.
pub async fn cors(request: Request, next: Next) -> Response {
    let requested_headers = request.headers().get(ACCESS_CONTROL_REQUEST_HEADERS).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    if let Some(requested) = requested_headers {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested);
    }
    response
}
