use super::normalize::normalize;
use super::policy::{DomainPolicy, HostShape};
use std::sync::Arc;

/// Derives a throttling key from a raw `Host` header without touching storage.
///
/// Only single-label subdomains of the platform produce a key. Custom domains
/// cannot be mapped to a tenant without a lookup, so they are left to the
/// per-IP limiter.
#[derive(Debug, Clone)]
pub struct RateKeyExtractor {
    policy: Arc<DomainPolicy>,
}

impl RateKeyExtractor {
    pub fn new(policy: Arc<DomainPolicy>) -> Self {
        Self { policy }
    }

    pub fn extract_key(&self, raw_host: &str) -> Option<String> {
        let host = normalize(raw_host)?;
        match self.policy.classify(&host) {
            HostShape::Subdomain(label) => Some(label.to_string()),
            _ => None,
        }
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.policy.is_reserved(key)
    }
}
