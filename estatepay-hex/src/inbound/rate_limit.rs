//! Rate limiting middleware using Governor.
//!
//! Implements per-client rate limiting with a token bucket algorithm, keyed
//! by the forwarded client address.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    /// Per-client rate limiters
    limiters: DashMap<String, Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    /// Default quota for new clients
    quota: Quota,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }
}

impl RateLimiterState {
    /// Creates a new rate limiter state.
    ///
    /// # Arguments
    /// * `requests` - Number of requests allowed per period
    /// * `period` - Time period for the quota
    pub fn new(requests: u32, period: Duration) -> Self {
        let quota = Quota::with_period(period)
            .unwrap()
            .allow_burst(NonZeroU32::new(requests).unwrap());

        Self {
            limiters: DashMap::new(),
            quota,
        }
    }

    /// Checks if a request should be rate limited.
    /// Returns true if the request is allowed, false if rate limited.
    pub fn check(&self, key: &str) -> bool {
        let limiter = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)));

        limiter.check().is_ok()
    }
}

/// Extracts the rate-limit key: first forwarded client address, or a shared
/// bucket for direct callers.
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "direct".to_string())
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Health checks should never be throttled
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let key = client_key(&request);

    if limiter.check(&key) {
        next.run(request).await
    } else {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Too many requests",
                "code": 429
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_forwarded(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/payments/rates");
        if let Some(v) = value {
            builder = builder.header("x-forwarded-for", v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_key_uses_first_forwarded_address() {
        let req = request_with_forwarded(Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&req), "203.0.113.9");
    }

    #[test]
    fn test_client_key_falls_back_for_direct_callers() {
        assert_eq!(client_key(&request_with_forwarded(None)), "direct");
        assert_eq!(client_key(&request_with_forwarded(Some(""))), "direct");
    }

    #[test]
    fn test_quota_exhausts() {
        let state = RateLimiterState::new(2, Duration::from_secs(60));
        assert!(state.check("203.0.113.9"));
        assert!(state.check("203.0.113.9"));
        assert!(!state.check("203.0.113.9"));
        // Other clients have their own bucket
        assert!(state.check("198.51.100.4"));
    }
}
