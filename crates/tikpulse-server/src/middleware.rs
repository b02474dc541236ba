use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: usize,
    /// Time until the oldest request in the window expires. Zero when allowed.
    pub retry_after: Duration,
}

/// Per-client request admission.
pub trait RateLimiter: Send + Sync {
    /// Record a request for `key` if it fits in the current window.
    fn check(&self, key: &str) -> RateDecision;
}

/// Sliding-window limiter: at most `max_requests` per `window` per key.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop clients whose whole window has lapsed so the map stays bounded.
        hits.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });

        let stamps = hits.entry(key.to_string()).or_default();
        while stamps
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() >= self.max_requests {
            let retry_after = stamps.front().map_or(self.window, |first| {
                (*first + self.window).saturating_duration_since(now)
            });
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after,
            };
        }

        stamps.push_back(now);
        RateDecision {
            allowed: true,
            remaining: self.max_requests - stamps.len(),
            retry_after: Duration::ZERO,
        }
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}

/// Shared handle passed to [`enforce_rate_limit`].
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Identify the caller: first `x-forwarded-for` hop, else the socket peer.
pub(crate) fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware enforcing the per-client sliding window.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(req.headers(), peer);
    let decision = rate_limit.limiter.check(&key);

    if !decision.allowed {
        let retry_secs = decision.retry_after.as_secs_f64().ceil().max(1.0);
        tracing::warn!(client = %key, retry_after_secs = retry_secs, "rate limit exceeded");
        let req_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        let mut res = ApiError::new(
            req_id,
            "rate_limited",
            format!("too many requests; retry in {retry_secs:.0}s"),
        )
        .into_response();
        if let Ok(val) = HeaderValue::from_str(&format!("{retry_secs:.0}")) {
            res.headers_mut().insert(RETRY_AFTER, val);
        }
        return res;
    }

    let mut res = next.run(req).await;
    res.headers_mut()
        .insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    res
}
