//! Decides whether the reverse proxy may provision a certificate for a host.

use crate::domain::{is_well_formed, normalize, DomainPolicy, DomainValidator, HostShape};
use crate::services::error::TenantStoreError;
use crate::services::tenant_store::TenantStore;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainVerdict {
    /// The platform's own root domain.
    Root,
    /// A single-label subdomain of the root; covered by the wildcard certificate.
    PlatformSubdomain,
    /// A valid custom domain held by a tenant.
    ClaimedCustomDomain,
    Denied,
}

impl DomainVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, DomainVerdict::Denied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainVerdict::Root => "root",
            DomainVerdict::PlatformSubdomain => "platform_subdomain",
            DomainVerdict::ClaimedCustomDomain => "custom_domain",
            DomainVerdict::Denied => "denied",
        }
    }
}

#[derive(Clone)]
pub struct DomainAuthorizer {
    policy: Arc<DomainPolicy>,
    validator: DomainValidator,
    store: Arc<dyn TenantStore>,
}

impl DomainAuthorizer {
    pub fn new(policy: Arc<DomainPolicy>, store: Arc<dyn TenantStore>) -> Self {
        let validator = DomainValidator::new(policy.clone());
        Self {
            policy,
            validator,
            store,
        }
    }

    /// Only the custom-domain branch touches the store.
    pub async fn authorize(&self, raw_domain: &str) -> Result<DomainVerdict, TenantStoreError> {
        let Some(domain) = normalize(raw_domain) else {
            return Ok(DomainVerdict::Denied);
        };

        // The development `.localhost` shapes resolve tenants but never earn a
        // certificate; only the configured root and its children do.
        match self.policy.classify(&domain) {
            HostShape::Platform if domain == self.policy.root_domain() => Ok(DomainVerdict::Root),
            HostShape::Subdomain(_)
                if self.policy.is_under_root(&domain) && is_well_formed(&domain) =>
            {
                Ok(DomainVerdict::PlatformSubdomain)
            }
            HostShape::Platform | HostShape::Subdomain(_) | HostShape::NestedSubdomain => {
                Ok(DomainVerdict::Denied)
            }
            HostShape::External => {
                if !self.validator.is_valid_redirect_target(&domain) {
                    return Ok(DomainVerdict::Denied);
                }
                if self.store.domain_is_already_claimed(&domain).await? {
                    Ok(DomainVerdict::ClaimedCustomDomain)
                } else {
                    Ok(DomainVerdict::Denied)
                }
            }
        }
    }
}
