pub mod domain_validation;
pub mod health;
pub mod home;

pub use domain_validation::{method_not_routed, validate_domain};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use home::{home, tenant_page};
