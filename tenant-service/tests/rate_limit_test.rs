mod common;

use axum::{
    body::Body,
    http::{header::RETRY_AFTER, Request, StatusCode},
    Router,
};
use common::{body_bytes, get, router_with, seeded_store, test_config};
use std::sync::Arc;
use std::time::Duration;
use tenant_service::{
    build_router, config::Environment, services::TenantStore, spawn_rate_limit_cleanup, AppState,
};
use tower::util::ServiceExt;

fn limited_router(tenant_limit: u32, reserved_scan_limit: u32) -> Router {
    let fixtures = seeded_store();
    let mut config = test_config(Environment::Prod);
    config.rate_limit.tenant_limit = tenant_limit;
    config.rate_limit.reserved_scan_limit = reserved_scan_limit;
    router_with(config, fixtures.store)
}

/// Probes a reserved subdomain. Returns the status and whether the body was
/// empty (throttled scanners get a bare 404; routing misses carry JSON).
async fn scan(app: &Router, host: &str, user_agent: &str) -> (StatusCode, bool) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/wp-login.php")
                .header("host", host)
                .header("user-agent", user_agent)
                .header("x-forwarded-for", "198.51.100.20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    assert!(response.headers().get(RETRY_AFTER).is_none());
    (status, body_bytes(response).await.is_empty())
}

#[tokio::test]
async fn tenant_key_over_limit_gets_429_with_retry_after() {
    let app = limited_router(2, 100);

    for _ in 0..2 {
        let response = get(&app, "blog.example-root.com", "/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(&app, "blog.example-root.com:443", "/").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(RETRY_AFTER)
        .expect("Retry-After header")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
}

#[tokio::test]
async fn tenant_keys_are_isolated() {
    let app = limited_router(1, 100);

    assert_eq!(get(&app, "blog.example-root.com", "/").await.status(), StatusCode::OK);
    assert_eq!(
        get(&app, "blog.example-root.com", "/").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_ne!(
        get(&app, "myblog.example-root.com", "/").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn custom_domains_are_not_host_keyed() {
    let app = limited_router(1, 100);

    for _ in 0..5 {
        let response = get(&app, "myblog.org", "/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn reserved_subdomain_scanners_get_bare_404() {
    let app = limited_router(100, 2);

    // Under the scanner quota the request reaches routing: no such tenant.
    for _ in 0..2 {
        assert_eq!(
            scan(&app, "admin.example-root.com", "scanner/1.0").await,
            (StatusCode::NOT_FOUND, false)
        );
    }

    assert_eq!(
        scan(&app, "admin.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, true)
    );
}

#[tokio::test]
async fn scanner_quota_is_per_client_fingerprint() {
    let app = limited_router(100, 1);

    assert_eq!(
        scan(&app, "admin.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, false)
    );
    // Same client moving to another reserved name shares the quota.
    assert_eq!(
        scan(&app, "api.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, true)
    );
    // A different user agent from the same IP has its own quota.
    assert_eq!(
        scan(&app, "admin.example-root.com", "curl/8.0").await,
        (StatusCode::NOT_FOUND, false)
    );
}

#[tokio::test]
async fn banned_scanner_stays_blocked_after_throttle_window_resets() {
    let fixtures = seeded_store();
    let mut config = test_config(Environment::Prod);
    config.rate_limit.reserved_scan_limit = 2;
    config.rate_limit.reserved_scan_window_seconds = 1;
    config.rate_limit.scanner_ban_max_retry = 3;
    config.rate_limit.scanner_ban_find_time_seconds = 60;
    config.rate_limit.scanner_ban_seconds = 3600;
    let app = router_with(config, fixtures.store);

    for _ in 0..2 {
        assert_eq!(
            scan(&app, "admin.example-root.com", "scanner/1.0").await,
            (StatusCode::NOT_FOUND, false)
        );
    }
    // Third probe hits the throttle and starts the ban.
    assert_eq!(
        scan(&app, "admin.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, true)
    );

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(
        scan(&app, "admin.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, true)
    );
    assert_eq!(
        scan(&app, "www.example-root.com", "scanner/1.0").await,
        (StatusCode::NOT_FOUND, true)
    );
    // Other fingerprints are unaffected.
    assert_eq!(
        scan(&app, "admin.example-root.com", "curl/8.0").await,
        (StatusCode::NOT_FOUND, false)
    );
}

#[tokio::test]
async fn cleanup_task_evicts_stale_limiter_keys() {
    let fixtures = seeded_store();
    let mut config = test_config(Environment::Prod);
    config.rate_limit.cleanup_interval_seconds = 1;
    let store: Arc<dyn TenantStore> = fixtures.store;
    let state = AppState::new(config, store).expect("Failed to build app state");
    let app = build_router(state.clone());

    for i in 0..50 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("host", format!("nosuchtenant{i}.example-root.com"))
                    .header("x-forwarded-for", format!("198.51.100.{i}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    assert_eq!(state.ip_rate_limiter.len(), 50);

    let cleanup = spawn_rate_limit_cleanup(&state);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    cleanup.abort();

    assert!(state.ip_rate_limiter.is_empty());
}
