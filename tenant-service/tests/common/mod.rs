//! Shared setup for tenant-service integration tests.
//!
//! Routers are built over an in-memory tenant store; no external services
//! are needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tenant_service::{
    build_router,
    config::{DomainConfig, Environment, RateLimitConfig, StoreBackend, StoreConfig, TenantConfig},
    models::Tenant,
    services::{InMemoryTenantStore, TenantStore},
    AppState, Application,
};
use tower::util::ServiceExt;

pub const ROOT_DOMAIN: &str = "example-root.com";

pub fn test_config(environment: Environment) -> TenantConfig {
    TenantConfig {
        common: CoreConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        environment,
        service_name: "tenant-service-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        domain: DomainConfig {
            root_domain: ROOT_DOMAIN.to_string(),
            reserved_words: None,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb_uri: String::new(),
            mongodb_database: "tenant_test".to_string(),
            seed_path: None,
        },
        rate_limit: RateLimitConfig {
            tenant_limit: 1000,
            tenant_window_seconds: 60,
            reserved_scan_limit: 1000,
            reserved_scan_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
            scanner_ban_max_retry: 1000,
            ..RateLimitConfig::default()
        },
    }
}

/// Tenants used across the suites:
/// - `plain`: subdomain only
/// - `custom`: subdomain `myblog` with custom domain `myblog.org`
/// - `broken`: a stored custom domain that fails validation
pub struct Fixtures {
    pub store: Arc<InMemoryTenantStore>,
    pub plain: Tenant,
    pub custom: Tenant,
    pub broken: Tenant,
}

pub fn seeded_store() -> Fixtures {
    let store = Arc::new(InMemoryTenantStore::new());
    let plain = store
        .insert(Tenant::new("user-1").with_subdomain("blog").with_title("Plain"))
        .expect("insert plain tenant");
    let custom = store
        .insert(
            Tenant::new("user-2")
                .with_subdomain("myblog")
                .with_custom_domain("myblog.org")
                .with_title("Custom"),
        )
        .expect("insert custom tenant");
    let broken = store
        .insert(
            Tenant::new("user-3")
                .with_subdomain("broken")
                .with_custom_domain("127.0.0.1"),
        )
        .expect("insert broken tenant");

    Fixtures {
        store,
        plain,
        custom,
        broken,
    }
}

pub fn router_with(config: TenantConfig, store: Arc<InMemoryTenantStore>) -> Router {
    let store: Arc<dyn TenantStore> = store;
    let state = AppState::new(config, store).expect("Failed to build app state");
    build_router(state)
}

pub fn test_router(store: Arc<InMemoryTenantStore>) -> Router {
    router_with(test_config(Environment::Prod), store)
}

pub async fn send(router: &Router, method: Method, host: &str, uri: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("host", host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(router: &Router, host: &str, uri: &str) -> Response {
    send(router, Method::GET, host, uri).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}

/// Running server on a random port, for tests that go over the network.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryTenantStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let fixtures = seeded_store();
        let store: Arc<dyn TenantStore> = fixtures.store.clone();

        let app = Application::build_with_store(test_config(Environment::Prod), store)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store: fixtures.store,
        }
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client")
    }
}
