//! Host-keyed throttling that runs ahead of tenant resolution. No storage
//! access happens here.

use service_core::{
    axum::{
        extract::{Request, State},
        http::{header::USER_AGENT, StatusCode},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    error::AppError,
    middleware::rate_limit::{
        check_keyed, client_ip, create_keyed_rate_limiter, prune_keyed, KeyedRateLimiter,
    },
};

use super::scanner_ban::ScannerBans;
use crate::config::RateLimitConfig;
use crate::domain::RateKeyExtractor;
use crate::utils::request_host;

/// User agents longer than this are cut before fingerprinting.
pub const MAX_FINGERPRINT_USER_AGENT: usize = 256;

#[derive(Clone)]
pub struct TenantRateLimiters {
    extractor: RateKeyExtractor,
    tenant: KeyedRateLimiter,
    reserved_scan: KeyedRateLimiter,
    scanner_bans: ScannerBans,
}

impl TenantRateLimiters {
    pub fn new(extractor: RateKeyExtractor, config: &RateLimitConfig) -> Self {
        Self {
            extractor,
            tenant: create_keyed_rate_limiter(config.tenant_limit, config.tenant_window_seconds),
            reserved_scan: create_keyed_rate_limiter(
                config.reserved_scan_limit,
                config.reserved_scan_window_seconds,
            ),
            scanner_bans: ScannerBans::from_config(config),
        }
    }

    /// Evicts replenished limiter keys and lapsed scanner bans.
    pub fn prune(&self) {
        prune_keyed(&self.tenant);
        prune_keyed(&self.reserved_scan);
        self.scanner_bans.prune();
    }
}

/// Requests for a reserved subdomain are counted per `{ip}/{user-agent}`
/// under the scanner quota and, once over it, get a bare 404. A fingerprint
/// that keeps probing is banned outright and gets the same 404 until the ban
/// lapses. Other platform subdomains are counted per subdomain label and get
/// 429 with `Retry-After`. Custom-domain hosts pass straight through.
pub async fn tenant_rate_limit_middleware(
    State(limiters): State<TenantRateLimiters>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(key) = request_host(request.headers(), request.uri())
        .and_then(|host| limiters.extractor.extract_key(host))
    else {
        return Ok(next.run(request).await);
    };

    if limiters.extractor.is_reserved(&key) {
        let fingerprint = scanner_fingerprint(&request);
        if limiters.scanner_bans.is_banned(&fingerprint) {
            metrics::counter!("rate_limited_total", "rule" => "reserved_scan_ban").increment(1);
            tracing::debug!(client = %fingerprint, "Banned scanner rejected");
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        if limiters.scanner_bans.record(&fingerprint) {
            tracing::warn!(subdomain = %key, client = %fingerprint, "Reserved subdomain scanner banned");
        }
        if check_keyed(&limiters.reserved_scan, &fingerprint).is_err() {
            metrics::counter!("rate_limited_total", "rule" => "reserved_scan").increment(1);
            tracing::warn!(
                subdomain = %key,
                client = %fingerprint,
                path = %request.uri().path(),
                "Reserved subdomain scan throttled"
            );
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        return Ok(next.run(request).await);
    }

    match check_keyed(&limiters.tenant, &key) {
        Ok(()) => Ok(next.run(request).await),
        Err(wait) => {
            metrics::counter!("rate_limited_total", "rule" => "tenant").increment(1);
            tracing::warn!(subdomain = %key, retry_after = wait, "Tenant request rate exceeded");
            Err(AppError::TooManyRequests(
                "Too many requests for this blog. Please try again later.".to_string(),
                Some(wait),
            ))
        }
    }
}

fn scanner_fingerprint(request: &Request) -> String {
    let ip = client_ip(request)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let user_agent: String = user_agent.chars().take(MAX_FINGERPRINT_USER_AGENT).collect();
    format!("{ip}/{user_agent}")
}
