//! Application wiring: shared state, router and server lifecycle.

use crate::config::{StoreBackend, TenantConfig};
use crate::domain::{DomainPolicy, DomainValidator, RateKeyExtractor};
use crate::handlers;
use crate::middleware::{tenant_rate_limit_middleware, tenant_resolution_middleware, TenantRateLimiters};
use crate::services::{
    DomainAuthorizer, InMemoryTenantStore, MongoTenantStore, SecureRedirectDecider, TenantResolver,
    TenantStore,
};
use service_core::axum::{
    body::Body,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, prune_keyed, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{http_request_span, request_id_middleware},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: TenantConfig,
    pub policy: Arc<DomainPolicy>,
    pub store: Arc<dyn TenantStore>,
    pub resolver: TenantResolver,
    pub redirects: SecureRedirectDecider,
    pub authorizer: DomainAuthorizer,
    pub rate_limiters: TenantRateLimiters,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: TenantConfig, store: Arc<dyn TenantStore>) -> Result<Self, AppError> {
        let policy = Arc::new(config.domain_policy()?);

        let resolver = TenantResolver::new(policy.clone(), store.clone());
        let redirects = SecureRedirectDecider::new(DomainValidator::new(policy.clone()));
        let authorizer = DomainAuthorizer::new(policy.clone(), store.clone());
        let rate_limiters =
            TenantRateLimiters::new(RateKeyExtractor::new(policy.clone()), &config.rate_limit);
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        tracing::info!(
            root_domain = %policy.root_domain(),
            development = policy.is_development(),
            reserved_words = policy.reserved_words().len(),
            "Domain policy loaded"
        );

        Ok(Self {
            config,
            policy,
            store,
            resolver,
            redirects,
            authorizer,
            rate_limiters,
            ip_rate_limiter,
        })
    }
}

/// Periodically evicts limiter keys and scanner bans that no longer carry
/// state. Every key is derived from request headers, so nothing else bounds them.
pub fn spawn_rate_limit_cleanup(state: &AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.rate_limit.cleanup_interval_seconds.max(1));
    let limiters = state.rate_limiters.clone();
    let ip_limiter = state.ip_rate_limiter.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiters.prune();
            prune_keyed(&ip_limiter);
            tracing::debug!(ip_keys = ip_limiter.len(), "Rate limiter state pruned");
        }
    })
}

pub fn build_router(state: AppState) -> Router {
    // Tenant-scoped pages: resolution, canonical redirect, tenant binding.
    let tenant_routes = Router::new()
        .route("/", get(handlers::home))
        .route("/*path", get(handlers::tenant_page))
        .layer(from_fn_with_state(state.clone(), tenant_resolution_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/api/domain-validation",
            get(handlers::validate_domain).fallback(handlers::method_not_routed),
        )
        .merge(tenant_routes)
        .with_state(state.clone())
        // Host-keyed throttling, before any store access
        .layer(from_fn_with_state(
            state.rate_limiters.clone(),
            tenant_rate_limit_middleware,
        ))
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| http_request_span(request)),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connects the configured tenant store and binds the listener.
    pub async fn build(config: TenantConfig) -> Result<Self, AppError> {
        let store: Arc<dyn TenantStore> = match config.store.backend {
            StoreBackend::Mongo => {
                let store =
                    MongoTenantStore::connect(&config.store.mongodb_uri, &config.store.mongodb_database)
                        .await?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(store)
            }
            StoreBackend::Memory => match &config.store.seed_path {
                Some(path) => Arc::new(InMemoryTenantStore::from_seed_file(path).await?),
                None => {
                    tracing::warn!("Using an empty in-memory tenant store");
                    Arc::new(InMemoryTenantStore::new())
                }
            },
        };

        Self::build_with_store(config, store).await
    }

    /// Binds the listener over an already constructed store (port 0 = random).
    pub async fn build_with_store(
        config: TenantConfig,
        store: Arc<dyn TenantStore>,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let state = AppState::new(config, store)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Tenant service listening");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cleanup = spawn_rate_limit_cleanup(&self.state);
        let app = build_router(self.state);
        let served = service_core::axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        cleanup.abort();
        served
    }
}
