use crate::domain::{normalize, DomainValidator};
use crate::models::Tenant;
use crate::utils::sanitize_path;

/// Outcome of [`SecureRedirectDecider::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Stay,
    /// Absolute `https://` URL on the tenant's custom domain.
    Redirect(String),
}

impl RedirectDecision {
    pub fn should_redirect(&self) -> bool {
        matches!(self, RedirectDecision::Redirect(_))
    }
}

/// Decides whether a request for a tenant must move to its custom domain.
#[derive(Debug, Clone)]
pub struct SecureRedirectDecider {
    validator: DomainValidator,
}

impl SecureRedirectDecider {
    pub fn new(validator: DomainValidator) -> Self {
        Self { validator }
    }

    pub fn decide(&self, tenant: &Tenant, current_host: &str, current_path: &str) -> RedirectDecision {
        let Some(custom_domain) = tenant.custom_domain() else {
            return RedirectDecision::Stay;
        };
        let Some(canonical) = normalize(custom_domain) else {
            tracing::error!(
                tenant_id = %tenant.id,
                custom_domain = %custom_domain,
                "Stored custom domain does not normalize; redirect suppressed"
            );
            return RedirectDecision::Stay;
        };

        if normalize(current_host).as_deref() == Some(canonical.as_str()) {
            return RedirectDecision::Stay;
        }

        if !self.validator.is_valid_redirect_target(custom_domain) {
            tracing::error!(
                tenant_id = %tenant.id,
                custom_domain = %custom_domain,
                "Stored custom domain failed validation; redirect suppressed"
            );
            return RedirectDecision::Stay;
        }

        RedirectDecision::Redirect(format!(
            "https://{}{}",
            custom_domain,
            sanitize_path(current_path)
        ))
    }
}
