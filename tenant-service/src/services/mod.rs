pub mod database;
pub mod domain_authorization;
pub mod error;
pub mod metrics;
pub mod redirect;
pub mod resolver;
pub mod tenant_store;

pub use database::MongoTenantStore;
pub use domain_authorization::{DomainAuthorizer, DomainVerdict};
pub use error::TenantStoreError;
pub use metrics::{get_metrics, init_metrics};
pub use redirect::{RedirectDecision, SecureRedirectDecider};
pub use resolver::TenantResolver;
pub use tenant_store::{HostKind, InMemoryTenantStore, TenantStore};
