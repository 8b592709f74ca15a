pub mod rate_limit;
pub mod scanner_ban;
pub mod tenant;

pub use rate_limit::{tenant_rate_limit_middleware, TenantRateLimiters};
pub use scanner_ban::ScannerBans;
pub use tenant::{tenant_resolution_middleware, CurrentTenant};
