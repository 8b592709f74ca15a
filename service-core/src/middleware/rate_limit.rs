use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use crate::error::AppError;
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Rate limiter keyed by an arbitrary string (tenant key, scanner fingerprint)
pub type KeyedRateLimiter = Arc<RateLimiter<String, DashMapStateStore<String>, DefaultClock>>;

/// Builds a quota allowing `attempts` cells per `window_seconds`, replenished evenly.
fn quota(attempts: u32, window_seconds: u64) -> Quota {
    let burst = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_millis(
        ((window_seconds.max(1) * 1000) / u64::from(burst.get())).max(1),
    );

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Create a keyed rate limiter (by IP)
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    Arc::new(RateLimiter::dashmap(quota(attempts, window_seconds)))
}

/// Create a rate limiter keyed by caller-derived strings
pub fn create_keyed_rate_limiter(attempts: u32, window_seconds: u64) -> KeyedRateLimiter {
    Arc::new(RateLimiter::dashmap(quota(attempts, window_seconds)))
}

/// Consumes one cell for `key`. A rejection carries the seconds to wait, for `Retry-After`.
pub fn check_keyed<K>(
    limiter: &RateLimiter<K, DashMapStateStore<K>, DefaultClock>,
    key: &K,
) -> Result<(), u64>
where
    K: std::hash::Hash + Eq + Clone,
{
    limiter.check_key(key).map(|_| ()).map_err(|negative| {
        negative
            .wait_time_from(DefaultClock::default().now())
            .as_secs()
            .max(1)
    })
}

/// Drops keys whose quota has fully replenished, then releases the freed
/// capacity. Keys are caller-controlled, so this must run periodically.
pub fn prune_keyed<K>(limiter: &RateLimiter<K, DashMapStateStore<K>, DefaultClock>)
where
    K: std::hash::Hash + Eq + Clone,
{
    limiter.retain_recent();
    limiter.shrink_to_fit();
}

/// Client IP: first `X-Forwarded-For` entry, else the socket peer address.
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request) {
        Some(ip) => match check_keyed(&limiter, &ip) {
            Ok(()) => Ok(next.run(request).await),
            Err(wait) => {
                metrics::counter!("rate_limited_total", "rule" => "ip").increment(1);
                tracing::warn!(ip = %ip, path = %request.uri().path(), "Request throttled by IP");
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
