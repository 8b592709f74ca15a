use crate::domain::{normalize, DomainPolicy, HostShape};
use crate::models::Tenant;
use crate::services::error::TenantStoreError;
use crate::services::tenant_store::{HostKind, TenantStore};
use std::sync::Arc;

/// Maps an inbound `Host` to the tenant that owns it.
#[derive(Clone)]
pub struct TenantResolver {
    policy: Arc<DomainPolicy>,
    store: Arc<dyn TenantStore>,
}

impl TenantResolver {
    pub fn new(policy: Arc<DomainPolicy>, store: Arc<dyn TenantStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// `Ok(None)` for malformed hosts, the platform root, nested subdomains
    /// and unknown names. `Err` only when the store could not answer.
    pub async fn resolve(&self, raw_host: &str) -> Result<Option<Tenant>, TenantStoreError> {
        let Some(host) = normalize(raw_host) else {
            tracing::debug!(raw_host = %raw_host, "Unusable host header");
            record("malformed");
            return Ok(None);
        };

        let (kind, value) = match self.policy.classify(&host) {
            HostShape::Platform => {
                record("platform");
                return Ok(None);
            }
            HostShape::NestedSubdomain => {
                tracing::debug!(host = %host, "Nested subdomain not resolved");
                record("nested");
                return Ok(None);
            }
            HostShape::Subdomain(label) => (HostKind::Subdomain, label),
            HostShape::External => (HostKind::CustomDomain, host.as_str()),
        };

        let tenant = self
            .store
            .find_by_normalized_host(kind, value)
            .await
            .inspect_err(|e| {
                tracing::error!(host = %host, kind = kind.as_str(), error = %e, "Tenant lookup failed");
                record("error");
            })?;

        match &tenant {
            Some(t) => {
                tracing::debug!(host = %host, tenant_id = %t.id, kind = kind.as_str(), "Tenant resolved");
                record("found");
            }
            None => {
                tracing::debug!(host = %host, kind = kind.as_str(), "No tenant for host");
                record("not_found");
            }
        }

        Ok(tenant)
    }
}

fn record(outcome: &'static str) {
    metrics::counter!("tenant_resolutions_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReservedWords;
    use crate::services::tenant_store::InMemoryTenantStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Wraps the in-memory store and records every lookup.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryTenantStore,
        lookups: Mutex<Vec<(HostKind, String)>>,
    }

    impl RecordingStore {
        fn lookups(&self) -> Vec<(HostKind, String)> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TenantStore for RecordingStore {
        async fn find_by_normalized_host(
            &self,
            kind: HostKind,
            value: &str,
        ) -> Result<Option<Tenant>, TenantStoreError> {
            self.lookups.lock().unwrap().push((kind, value.to_string()));
            self.inner.find_by_normalized_host(kind, value).await
        }

        async fn domain_is_already_claimed(&self, domain: &str) -> Result<bool, TenantStoreError> {
            self.inner.domain_is_already_claimed(domain).await
        }

        async fn health_check(&self) -> Result<(), TenantStoreError> {
            self.inner.health_check().await
        }
    }

    fn resolver(development: bool) -> (TenantResolver, Arc<RecordingStore>, Tenant) {
        let store = Arc::new(RecordingStore::default());
        let tenant = store
            .inner
            .insert(
                Tenant::new("u-1")
                    .with_subdomain("blog")
                    .with_custom_domain("myblog.org"),
            )
            .unwrap();
        let policy =
            DomainPolicy::new("example-root.com", development, ReservedWords::default()).unwrap();
        let resolver = TenantResolver::new(Arc::new(policy), store.clone());
        (resolver, store, tenant)
    }

    #[tokio::test]
    async fn resolves_subdomain_of_root() {
        let (resolver, store, tenant) = resolver(false);
        let found = resolver.resolve("blog.example-root.com").await.unwrap();
        assert_eq!(found, Some(tenant));
        assert_eq!(store.lookups(), vec![(HostKind::Subdomain, "blog".to_string())]);
    }

    #[tokio::test]
    async fn resolves_custom_domain_case_and_port_insensitively() {
        let (resolver, _, tenant) = resolver(false);
        let found = resolver.resolve("MyBlog.ORG:443").await.unwrap();
        assert_eq!(found, Some(tenant));
    }

    #[tokio::test]
    async fn unknown_custom_domain_is_not_found() {
        let (resolver, store, _) = resolver(false);
        assert_eq!(resolver.resolve("mytenant.com").await.unwrap(), None);
        assert_eq!(
            store.lookups(),
            vec![(HostKind::CustomDomain, "mytenant.com".to_string())]
        );
    }

    #[tokio::test]
    async fn single_label_subdomains_never_use_custom_domain_lookup() {
        let (resolver, store, _) = resolver(false);
        for label in ["abc", "x1", "z", "123", "myblog"] {
            resolver
                .resolve(&format!("{label}.example-root.com"))
                .await
                .unwrap();
        }
        assert!(store
            .lookups()
            .iter()
            .all(|(kind, _)| *kind == HostKind::Subdomain));
    }

    #[tokio::test]
    async fn platform_malformed_and_nested_hosts_skip_the_store() {
        let (resolver, store, _) = resolver(false);
        for host in ["example-root.com", "EXAMPLE-ROOT.com:80", "", ":8080", "a.blog.example-root.com"] {
            assert_eq!(resolver.resolve(host).await.unwrap(), None, "{host:?}");
        }
        assert!(store.lookups().is_empty());
    }

    #[tokio::test]
    async fn localhost_subdomains_resolve_only_in_development() {
        let (prod, prod_store, _) = resolver(false);
        assert_eq!(prod.resolve("blog.localhost:3000").await.unwrap(), None);
        assert_eq!(
            prod_store.lookups(),
            vec![(HostKind::CustomDomain, "blog.localhost".to_string())]
        );

        let (dev, _, tenant) = resolver(true);
        assert_eq!(dev.resolve("blog.localhost:3000").await.unwrap(), Some(tenant));
    }

    #[tokio::test]
    async fn store_failure_is_not_a_miss() {
        let (resolver, store, _) = resolver(false);
        store.inner.set_unavailable(true);
        assert!(resolver.resolve("blog.example-root.com").await.is_err());
    }
}
