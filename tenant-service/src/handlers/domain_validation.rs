//! TLS-provisioning check for the reverse proxy (on-demand certificates).
//!
//! Machine-to-machine: no session, cookie or signature is required, and the
//! proxy only looks at the status code.

use serde::Deserialize;
use service_core::axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
};

use crate::startup::AppState;
use crate::utils::request_host;

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

/// `200` when a certificate may be issued for the domain, `403` when not,
/// `503` when the claim check could not reach the tenant store.
pub async fn validate_domain(
    State(state): State<AppState>,
    query: Option<Query<DomainQuery>>,
    headers: HeaderMap,
    uri: Uri,
) -> StatusCode {
    // Duplicate or undecodable parameters are ambiguous: deny, do not guess.
    let Some(Query(query)) = query else {
        metrics::counter!("domain_validation_total", "result" => "denied").increment(1);
        tracing::debug!(query = uri.query().unwrap_or_default(), "Unparseable domain validation query");
        return StatusCode::FORBIDDEN;
    };

    let domain = query
        .domain
        .filter(|d| !d.trim().is_empty())
        .or_else(|| request_host(&headers, &uri).map(str::to_owned));

    let Some(domain) = domain else {
        metrics::counter!("domain_validation_total", "result" => "denied").increment(1);
        return StatusCode::FORBIDDEN;
    };

    match state.authorizer.authorize(domain.trim()).await {
        Ok(verdict) => {
            metrics::counter!("domain_validation_total", "result" => verdict.as_str()).increment(1);
            tracing::debug!(domain = %domain, verdict = verdict.as_str(), "Domain validation");
            if verdict.is_allowed() {
                StatusCode::OK
            } else {
                StatusCode::FORBIDDEN
            }
        }
        Err(e) => {
            metrics::counter!("domain_validation_total", "result" => "error").increment(1);
            tracing::error!(domain = %domain, error = %e, "Domain validation claim check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Non-GET methods on the validation path look like an unknown route.
pub async fn method_not_routed() -> StatusCode {
    StatusCode::NOT_FOUND
}
