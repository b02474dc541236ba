mod account;
mod analyze;
mod patterns;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tikpulse_advice::{AdviceGenerator, AdviceItem, AdviceReport};
use tikpulse_core::AppConfig;
use tikpulse_fetch::{FetchError, PageFetcher};
use tikpulse_store::{AnalysisStore, StoreError};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{ResponseCache, TtlCache};
use crate::middleware::{
    enforce_rate_limit, request_id, RateLimitState, RequestId, SlidingWindowLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub fetcher: PageFetcher,
    pub advice: Option<AdviceGenerator>,
    pub store: Arc<AnalysisStore>,
    pub cache: Arc<dyn ResponseCache>,
}

impl AppState {
    /// Wire every collaborator from configuration.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be constructed.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let fetcher = PageFetcher::from_config(&config)?;
        let advice = AdviceGenerator::from_config(&config)?;
        let store = AnalysisStore::from_config(&config)?;
        let cache = TtlCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_items,
        );
        tracing::info!(
            store = store.kv().backend_name(),
            proxy = fetcher.has_proxy(),
            ai = advice.is_some(),
            "collaborators ready"
        );
        Ok(Self {
            config,
            fetcher,
            advice,
            store: Arc::new(store),
            cache: Arc::new(cache),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
    ai: bool,
    proxy: bool,
    cache_entries: usize,
}

/// Where the advice in a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum AdviceSource {
    Llm,
    Heuristic,
}

/// Advice section shared by video and account responses.
#[derive(Debug, Clone, Serialize)]
pub(super) struct AdviceSection {
    pub source: AdviceSource,
    pub items: Vec<AdviceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AdviceReport>,
}

impl AdviceSection {
    pub(super) fn llm(report: AdviceReport) -> Self {
        Self {
            source: AdviceSource::Llm,
            items: report.advice.clone(),
            report: Some(report),
        }
    }

    pub(super) fn heuristic(items: Vec<AdviceItem>) -> Self {
        Self {
            source: AdviceSource::Heuristic,
            items,
            report: None,
        }
    }
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "extraction_failed" => StatusCode::UNPROCESSABLE_ENTITY,
            "fetch_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn ok<T: Serialize>(req_id: String, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id),
    })
}

pub(super) fn map_fetch_error(request_id: String, error: &FetchError) -> ApiError {
    match error {
        FetchError::InvalidUrl { .. } => {
            ApiError::new(request_id, "bad_request", error.to_string())
        }
        FetchError::NotFound { .. } => ApiError::new(request_id, "not_found", error.to_string()),
        // Transport errors can embed request URLs; keep them out of responses.
        FetchError::Http(_) => {
            tracing::warn!(error = %error, "page fetch failed");
            ApiError::new(request_id, "fetch_failed", "upstream request failed")
        }
        _ => {
            tracing::warn!(error = %error, "page fetch failed");
            ApiError::new(request_id, "fetch_failed", error.to_string())
        }
    }
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    tracing::error!(error = %error, "store query failed");
    ApiError::new(request_id, "internal_error", "store query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn analysis_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(analyze::analyze_video))
        .route("/api/v1/analyze-account", post(account::analyze_account))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/patterns", get(patterns::get_patterns));

    Router::new()
        .merge(public_routes)
        .merge(analysis_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

pub fn rate_limit_state_from_config(config: &AppConfig) -> RateLimitState {
    RateLimitState::new(Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    )))
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    ok(
        req_id.0,
        HealthData {
            status: "ok",
            store: state.store.kv().backend_name(),
            ai: state.advice.is_some(),
            proxy: state.fetcher.has_proxy(),
            cache_entries: state.cache.len(),
        },
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
