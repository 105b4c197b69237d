//! Per-IP rate limiting for the public auth routes.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Interval between sweeps of idle client entries.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Limiter state shared by the auth routes.
pub struct RateLimitState {
    login: KeyedLimiter,
    login_rate_limit: u32,
}

impl RateLimitState {
    /// Create a limiter allowing `login_rate_limit` requests per minute per client.
    ///
    /// A limit of zero is treated as one.
    pub fn new(login_rate_limit: u32) -> Self {
        let per_minute = NonZeroU32::new(login_rate_limit).unwrap_or(NonZeroU32::MIN);
        Self {
            login: RateLimiter::keyed(Quota::per_minute(per_minute)),
            login_rate_limit: per_minute.get(),
        }
    }

    /// Requests per minute allowed for each client.
    pub fn login_rate_limit(&self) -> u32 {
        self.login_rate_limit
    }

    /// Record an auth attempt from `client`; `false` if it is over the limit.
    pub fn check_login(&self, client: &str) -> bool {
        self.login.check_key(&client.to_string()).is_ok()
    }

    /// Forget clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.login.retain_recent();
        self.login.shrink_to_fit();
    }

    /// Sweep idle entries in the background.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Client address: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the peer.
fn client_ip(req: &Request<Body>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("X-Forwarded-For").and_then(|v| v.split(',').next()) {
        return first.trim().to_string();
    }
    if let Some(real_ip) = header("X-Real-IP") {
        return real_ip.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects auth requests over the per-IP limit with 429.
pub async fn auth_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, path = %req.uri().path(), "auth rate limit exceeded");
        return ApiError::too_many_requests("Too many attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
