//! Per-client request throttling.
//!
//! Each (client IP, tier) pair gets a fixed budget of requests per window.
//! Credential endpoints use the stricter `Auth` tier so password guessing is
//! throttled separately from ordinary API traffic.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Authenticated API traffic
    Api,
    /// Register and login
    Auth,
}

/// Budget left to one client in the current window
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Outcome of an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window restarts
    pub reset_after: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<(IpAddr, RateLimitTier), Window>,
    config: RateLimitConfig,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_secs(config.window_seconds),
            config,
        }
    }

    pub fn limit(&self, tier: RateLimitTier) -> u32 {
        match tier {
            RateLimitTier::Api => self.config.api_requests_per_window,
            RateLimitTier::Auth => self.config.auth_requests_per_window,
        }
    }

    /// Count a request against the client's budget.
    /// Returns the remaining quota, or the seconds to wait when exhausted.
    pub fn check(&self, ip: IpAddr, tier: RateLimitTier) -> Result<Quota, u64> {
        self.check_at(ip, tier, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, tier: RateLimitTier, now: Instant) -> Result<Quota, u64> {
        let limit = self.limit(tier);
        if !self.config.enabled {
            return Ok(Quota {
                limit,
                remaining: limit,
                reset_after: 0,
            });
        }

        let mut window = self.windows.entry((ip, tier)).or_insert(Window {
            started: now,
            used: 0,
        });

        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                used: 0,
            };
        }

        let reset_after = self
            .window
            .saturating_sub(now.duration_since(window.started))
            .as_secs()
            .max(1);

        if window.used >= limit {
            return Err(reset_after);
        }

        window.used += 1;
        Ok(Quota {
            limit,
            remaining: limit - window.used,
            reset_after,
        })
    }

    /// Forget clients whose window has long passed
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let keep_for = self.window * 2;
        self.windows
            .retain(|_, window| now.duration_since(window.started) < keep_for);
    }

    pub fn entry_count(&self) -> usize {
        self.windows.len()
    }
}

/// Client address from proxy headers; loopback when none is usable
fn client_ip(headers: &HeaderMap) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_api(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    throttle(&state, request, next, RateLimitTier::Api).await
}

pub async fn rate_limit_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    throttle(&state, request, next, RateLimitTier::Auth).await
}

async fn throttle(
    state: &AppState,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let ip = client_ip(request.headers());

    match state.rate_limiter.check(ip, tier) {
        Ok(quota) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(quota.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(quota.remaining));
            response
        }
        Err(retry_after) => {
            tracing::warn!(%ip, ?tier, retry_after, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(format!(
                "Too many requests. Try again in {} seconds.",
                retry_after
            ))
            .into_response();
            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            headers.insert(
                "X-RateLimit-Limit",
                HeaderValue::from(state.rate_limiter.limit(tier)),
            );
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}

/// Periodically drop stale client windows
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                entries = rate_limiter.entry_count(),
                "Rate limiter cleanup complete"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            api_requests_per_window: 4,
            auth_requests_per_window: 2,
            window_seconds: 60,
            cleanup_interval: 300,
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_budget_is_per_client_and_tier() {
        let limiter = RateLimiter::new(config());
        let now = Instant::now();

        assert_eq!(limiter.check_at(ip(1), RateLimitTier::Auth, now).unwrap().remaining, 1);
        assert_eq!(limiter.check_at(ip(1), RateLimitTier::Auth, now).unwrap().remaining, 0);
        assert_eq!(limiter.check_at(ip(1), RateLimitTier::Auth, now), Err(60));

        assert!(limiter.check_at(ip(1), RateLimitTier::Api, now).is_ok());
        assert!(limiter.check_at(ip(2), RateLimitTier::Auth, now).is_ok());
    }

    #[test]
    fn test_window_restarts() {
        let limiter = RateLimiter::new(config());
        let start = Instant::now();
        for _ in 0..4 {
            limiter.check_at(ip(1), RateLimitTier::Api, start).unwrap();
        }
        assert_eq!(
            limiter.check_at(ip(1), RateLimitTier::Api, start + Duration::from_secs(45)),
            Err(15)
        );

        let later = start + Duration::from_secs(60);
        let quota = limiter.check_at(ip(1), RateLimitTier::Api, later).unwrap();
        assert_eq!(quota.remaining, 3);
    }

    #[test]
    fn test_disabled_never_blocks() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: false,
            ..config()
        });
        for _ in 0..50 {
            assert!(limiter.check(ip(1), RateLimitTier::Auth).is_ok());
        }
        assert_eq!(limiter.entry_count(), 0);
    }

    #[test]
    fn test_cleanup_keeps_recent_windows() {
        let limiter = RateLimiter::new(config());
        limiter.check(ip(1), RateLimitTier::Api).unwrap();
        limiter.cleanup_expired();
        assert_eq!(limiter.entry_count(), 1);
    }

    #[test]
    fn test_client_ip_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), IpAddr::V4(Ipv4Addr::LOCALHOST));

        headers.insert("x-real-ip", HeaderValue::from_static("10.1.1.1"));
        assert_eq!(client_ip(&headers), "10.1.1.1".parse::<IpAddr>().unwrap());

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7".parse::<IpAddr>().unwrap());
    }
}
