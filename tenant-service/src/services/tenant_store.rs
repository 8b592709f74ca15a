//! Read contract over tenant records, plus the in-memory adapter used in
//! development and tests.

use crate::models::Tenant;
use crate::services::error::TenantStoreError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which identifying field a lookup is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Subdomain,
    CustomDomain,
}

impl HostKind {
    /// Document field holding the value.
    pub fn field(&self) -> &'static str {
        match self {
            HostKind::Subdomain => "subdomain",
            HostKind::CustomDomain => "custom_domain",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.field()
    }
}

/// Lookups consumed by resolution and domain validation. Values are already
/// normalized; implementations compare them exactly.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_by_normalized_host(
        &self,
        kind: HostKind,
        value: &str,
    ) -> Result<Option<Tenant>, TenantStoreError>;

    async fn domain_is_already_claimed(&self, domain: &str) -> Result<bool, TenantStoreError>;

    async fn health_check(&self) -> Result<(), TenantStoreError>;
}

/// Tenant store held in process memory. Uniqueness of subdomains and custom
/// domains is enforced on insert.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    tenants: DashMap<String, Tenant>,
    subdomains: DashMap<String, String>,
    custom_domains: DashMap<String, String>,
    unavailable: AtomicBool,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of tenants, e.g. from `TENANT_SEED_PATH`.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, TenantStoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TenantStoreError::Seed(format!("{}: {}", path.display(), e)))?;
        let tenants: Vec<Tenant> = serde_json::from_str(&raw)
            .map_err(|e| TenantStoreError::Seed(format!("{}: {}", path.display(), e)))?;

        let store = Self::new();
        for tenant in tenants {
            store.insert(tenant)?;
        }
        tracing::info!(
            path = %path.display(),
            tenants = store.len(),
            "Loaded tenant seed data"
        );
        Ok(store)
    }

    /// Stores `tenant` with its identifying fields trimmed and lowercased.
    /// Fails with `Conflict` if another tenant already holds either value.
    pub fn insert(&self, mut tenant: Tenant) -> Result<Tenant, TenantStoreError> {
        tenant.subdomain = tenant.subdomain().map(str::to_ascii_lowercase);
        tenant.custom_domain = tenant.custom_domain().map(str::to_ascii_lowercase);

        if let Some(subdomain) = tenant.subdomain.clone() {
            claim(&self.subdomains, subdomain, &tenant.id)?;
        }

        if let Some(domain) = tenant.custom_domain.clone() {
            if let Err(e) = claim(&self.custom_domains, domain, &tenant.id) {
                if let Some(subdomain) = tenant.subdomain.as_deref() {
                    self.subdomains.remove(subdomain);
                }
                return Err(e);
            }
        }

        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Simulates an outage: every call fails until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), TenantStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TenantStoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn claim(
    index: &DashMap<String, String>,
    value: String,
    tenant_id: &str,
) -> Result<(), TenantStoreError> {
    match index.entry(value) {
        Entry::Occupied(existing) if existing.get() != tenant_id => Err(
            TenantStoreError::Conflict(format!("{} is already claimed", existing.key())),
        ),
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(slot) => {
            slot.insert(tenant_id.to_string());
            Ok(())
        }
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find_by_normalized_host(
        &self,
        kind: HostKind,
        value: &str,
    ) -> Result<Option<Tenant>, TenantStoreError> {
        self.ensure_available()?;

        let index = match kind {
            HostKind::Subdomain => &self.subdomains,
            HostKind::CustomDomain => &self.custom_domains,
        };

        let tenant = index
            .get(value)
            .and_then(|id| self.tenants.get(id.value()).map(|t| t.value().clone()));
        Ok(tenant)
    }

    async fn domain_is_already_claimed(&self, domain: &str) -> Result<bool, TenantStoreError> {
        self.ensure_available()?;
        Ok(self.custom_domains.contains_key(domain))
    }

    async fn health_check(&self) -> Result<(), TenantStoreError> {
        self.ensure_available()
    }
}
