//! Write-time checks for subdomain and custom-domain assignment.
//!
//! The hot-path validator only answers yes or no; these functions re-run the
//! same rules and report which one failed, for the tenant-management forms.

use super::policy::DomainPolicy;
use super::validator::DomainValidator;
use crate::models::Tenant;
use crate::services::error::TenantStoreError;
use crate::services::tenant_store::{HostKind, TenantStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;

pub const SUBDOMAIN_LENGTH: RangeInclusive<usize> = 3..=63;

static SUBDOMAIN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+$").expect("subdomain pattern is a valid regex"));

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("subdomain may only contain letters and numbers")]
    SubdomainCharacters,

    #[error("subdomain must be between 3 and 63 characters")]
    SubdomainLength,

    #[error("subdomain is reserved")]
    SubdomainReserved,

    #[error("subdomain has already been taken")]
    SubdomainTaken,

    #[error("custom domain must be a valid domain name")]
    InvalidCustomDomain,

    #[error("custom domain cannot be {0} or one of its subdomains")]
    PlatformDomain(String),

    #[error("custom domain has already been taken")]
    DomainTaken,

    #[error(transparent)]
    Store(#[from] TenantStoreError),
}

/// Normalizes and checks a requested subdomain. Returns the stored form.
pub fn validate_subdomain(policy: &DomainPolicy, raw: &str) -> Result<String, AssignmentError> {
    let subdomain = raw.trim().to_ascii_lowercase();

    if !SUBDOMAIN_CHARS.is_match(&subdomain) {
        return Err(AssignmentError::SubdomainCharacters);
    }
    if !SUBDOMAIN_LENGTH.contains(&subdomain.len()) {
        return Err(AssignmentError::SubdomainLength);
    }
    if policy.is_reserved(&subdomain) {
        return Err(AssignmentError::SubdomainReserved);
    }

    Ok(subdomain)
}

/// Normalizes and checks a requested custom domain. Blank input clears the
/// domain and yields `Ok(None)`.
pub fn validate_custom_domain(
    policy: &Arc<DomainPolicy>,
    raw: &str,
) -> Result<Option<String>, AssignmentError> {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Ok(None);
    }
    let domain = lowered.strip_suffix('.').unwrap_or(&lowered);

    if domain.contains("..") || domain.chars().any(|c| c.is_control()) {
        return Err(AssignmentError::InvalidCustomDomain);
    }
    if policy.is_platform_owned(domain) {
        return Err(AssignmentError::PlatformDomain(
            policy.root_domain().to_string(),
        ));
    }
    if !DomainValidator::new(Arc::clone(policy)).is_valid_redirect_target(domain) {
        return Err(AssignmentError::InvalidCustomDomain);
    }

    Ok(Some(domain.to_string()))
}

/// Rejects a subdomain held by a tenant other than `current`.
pub async fn check_subdomain_available(
    store: &dyn TenantStore,
    current: Option<&Tenant>,
    subdomain: &str,
) -> Result<(), AssignmentError> {
    let holder = store
        .find_by_normalized_host(HostKind::Subdomain, subdomain)
        .await?;

    match holder {
        Some(holder) if current.map_or(true, |t| t.id != holder.id) => {
            Err(AssignmentError::SubdomainTaken)
        }
        _ => Ok(()),
    }
}

/// Rejects a custom domain already claimed by another tenant. A tenant
/// re-saving its own domain passes.
pub async fn check_custom_domain_available(
    store: &dyn TenantStore,
    current: Option<&Tenant>,
    domain: &str,
) -> Result<(), AssignmentError> {
    if current.and_then(Tenant::custom_domain) == Some(domain) {
        return Ok(());
    }

    if store.domain_is_already_claimed(domain).await? {
        return Err(AssignmentError::DomainTaken);
    }

    Ok(())
}
