//! Tenant (blog) record as stored by the tenant-management service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A blog reachable through a platform subdomain, a custom domain, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
}

impl Tenant {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: None,
            subdomain: None,
            custom_domain: None,
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn with_custom_domain(mut self, custom_domain: impl Into<String>) -> Self {
        self.custom_domain = Some(custom_domain.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Blank strings count as absent; older records stored `""` instead of null.
    pub fn uses_custom_domain(&self) -> bool {
        self.custom_domain().is_some()
    }

    pub fn custom_domain(&self) -> Option<&str> {
        self.custom_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The single public host this tenant is served from: the custom domain
    /// when set, otherwise `{subdomain}.{root_domain}`.
    pub fn canonical_host(&self, root_domain: &str) -> Option<String> {
        if let Some(domain) = self.custom_domain() {
            return Some(domain.to_string());
        }
        self.subdomain()
            .map(|subdomain| format!("{subdomain}.{root_domain}"))
    }
}
