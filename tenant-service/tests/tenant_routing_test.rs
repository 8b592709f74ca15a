mod common;

use axum::http::{header::LOCATION, StatusCode};
use common::{body_json, get, router_with, seeded_store, test_config, test_router};
use tenant_service::config::Environment;

#[tokio::test]
async fn subdomain_request_is_bound_to_tenant() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "blog.example-root.com", "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["tenant_id"], fixtures.plain.id);
    assert_eq!(body["canonical_host"], "blog.example-root.com");
}

#[tokio::test]
async fn custom_domain_request_is_served_in_place() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "MyBlog.org:443", "/posts/hello").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["tenant_id"], fixtures.custom.id);
    assert_eq!(body["path"], "posts/hello");
}

#[tokio::test]
async fn subdomain_of_custom_domain_tenant_redirects_permanently() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "myblog.example-root.com", "/posts/hello?page=2").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://myblog.org/posts/hello?page=2"
    );

    let response = get(&app, "myblog.example-root.com", "/").await;
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://myblog.org/"
    );
}

#[tokio::test]
async fn invalid_stored_domain_does_not_redirect() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "broken.example-root.com", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(LOCATION).is_none());

    let body = body_json(response).await;
    assert_eq!(body["tenant_id"], fixtures.broken.id);
}

#[tokio::test]
async fn unknown_hosts_are_not_found() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    for host in ["mytenant.com", "nobody.example-root.com", "a.blog.example-root.com"] {
        let response = get(&app, host, "/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{host}");
    }
}

#[tokio::test]
async fn root_domain_serves_platform_page() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "Example-Root.com", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["platform"], "example-root.com");

    // Tenant-only pages need a tenant.
    let response = get(&app, "example-root.com", "/some-post").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_is_a_server_error_not_a_miss() {
    let fixtures = seeded_store();
    let store = fixtures.store.clone();
    let app = test_router(fixtures.store);
    store.set_unavailable(true);

    let response = get(&app, "blog.example-root.com", "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn localhost_subdomains_only_resolve_in_development() {
    let fixtures = seeded_store();
    let prod = test_router(fixtures.store.clone());
    let dev = router_with(test_config(Environment::Dev), fixtures.store);

    let response = get(&prod, "blog.localhost:3000", "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&dev, "blog.localhost:3000", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tenant_id"], fixtures.plain.id);
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let fixtures = seeded_store();
    let app = test_router(fixtures.store);

    let response = get(&app, "blog.example-root.com", "/").await;
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
