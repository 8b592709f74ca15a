//! Placeholder pages. Rendering belongs to the content service; these only
//! report which tenant the request was bound to.

use serde_json::{json, Value};
use service_core::axum::{
    extract::{Path, State},
    Json,
};

use crate::middleware::CurrentTenant;
use crate::startup::AppState;

/// `/` on the platform root describes the platform; on a tenant host it
/// describes the tenant.
pub async fn home(State(state): State<AppState>, tenant: Option<CurrentTenant>) -> Json<Value> {
    match tenant {
        Some(CurrentTenant(tenant)) => Json(tenant_body(&state, &tenant, None)),
        None => Json(json!({
            "platform": state.policy.root_domain(),
            "service": state.config.service_name,
        })),
    }
}

/// Any other path on a tenant host, e.g. a post slug.
pub async fn tenant_page(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(path): Path<String>,
) -> Json<Value> {
    Json(tenant_body(&state, &tenant, Some(&path)))
}

fn tenant_body(state: &AppState, tenant: &crate::models::Tenant, path: Option<&str>) -> Value {
    json!({
        "tenant_id": tenant.id,
        "title": tenant.title,
        "canonical_host": tenant.canonical_host(state.policy.root_domain()),
        "path": path,
    })
}
