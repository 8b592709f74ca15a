//! Host-based tenant routing.
//!
//! Resolves the request host to a tenant, enforces the canonical custom
//! domain with a permanent redirect, and binds the tenant to the request so
//! handlers can take a [`CurrentTenant`] argument.

use service_core::{
    axum::{
        async_trait,
        extract::{FromRequestParts, Request, State},
        http::{header::LOCATION, request::Parts, HeaderValue, StatusCode},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    error::AppError,
};

use crate::domain::{normalize, HostShape};
use crate::models::Tenant;
use crate::services::RedirectDecision;
use crate::startup::AppState;
use crate::utils::request_host;

/// The tenant bound to the current request.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Tenant);

/// Applied to tenant-scoped routes. The bare platform host passes through
/// without a tenant; unknown hosts get 404; store failures get 500.
pub async fn tenant_resolution_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let raw_host = request_host(request.headers(), request.uri())
        .map(str::to_owned)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Blog not found")))?;

    let Some(host) = normalize(&raw_host) else {
        return Err(AppError::NotFound(anyhow::anyhow!("Blog not found")));
    };

    if state.policy.classify(&host) == HostShape::Platform {
        return Ok(next.run(request).await);
    }

    let tenant = state
        .resolver
        .resolve(&host)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Blog not found")))?;

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match state.redirects.decide(&tenant, &host, path) {
        RedirectDecision::Redirect(location) => {
            tracing::info!(
                tenant_id = %tenant.id,
                from = %host,
                to = %location,
                "Redirecting to canonical custom domain"
            );
            metrics::counter!("tenant_redirects_total").increment(1);
            permanent_redirect(&location)
        }
        RedirectDecision::Stay => {
            request.extensions_mut().insert(CurrentTenant(tenant));
            Ok(next.run(request).await)
        }
    }
}

/// `301 Moved Permanently` to an absolute, possibly off-host URL. axum's
/// `Redirect::permanent` answers 308, which is not what browsers cache for
/// domain moves.
fn permanent_redirect(location: &str) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(location).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Invalid redirect location: {}", e))
    })?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentTenant>()
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Blog not found")))
    }
}
