use service_core::error::AppError;
use thiserror::Error;

/// Failures of the tenant store. Never used to mean "no such tenant".
#[derive(Error, Debug)]
pub enum TenantStoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Tenant store unavailable: {0}")]
    Unavailable(String),

    #[error("Uniqueness violation: {0}")]
    Conflict(String),

    #[error("Invalid seed data: {0}")]
    Seed(String),
}

impl From<TenantStoreError> for AppError {
    fn from(err: TenantStoreError) -> Self {
        match err {
            TenantStoreError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            TenantStoreError::Unavailable(msg) => AppError::DatabaseError(anyhow::anyhow!(msg)),
            TenantStoreError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            TenantStoreError::Seed(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
        }
    }
}
