use crate::models::Tenant;
use crate::services::error::TenantStoreError;
use crate::services::tenant_store::{HostKind, TenantStore};
use async_trait::async_trait;
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

const TENANTS_COLLECTION: &str = "tenants";

/// MongoDB-backed tenant store over the `tenants` collection.
#[derive(Clone)]
pub struct MongoTenantStore {
    client: MongoClient,
    db: Database,
}

impl MongoTenantStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Unique indexes back the "no two tenants share a host" rule. Partial
    /// filters skip documents where the field is absent.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for tenant-service");

        let tenants = self.tenants();

        for kind in [HostKind::Subdomain, HostKind::CustomDomain] {
            let field = kind.field();
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("{field}_unique_idx"))
                        .unique(true)
                        .partial_filter_expression(doc! { field: { "$type": "string" } })
                        .build(),
                )
                .build();

            tenants.create_index(index, None).await.map_err(|e| {
                tracing::error!("Failed to create {} index: {}", field, e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        }

        tracing::info!("MongoDB indexes created successfully");
        Ok(())
    }

    pub fn tenants(&self) -> Collection<Tenant> {
        self.db.collection(TENANTS_COLLECTION)
    }
}

#[async_trait]
impl TenantStore for MongoTenantStore {
    async fn find_by_normalized_host(
        &self,
        kind: HostKind,
        value: &str,
    ) -> Result<Option<Tenant>, TenantStoreError> {
        let tenant = self
            .tenants()
            .find_one(doc! { kind.field(): value }, None)
            .await
            .map_err(|e| {
                tracing::error!(kind = kind.as_str(), "Tenant lookup failed: {}", e);
                TenantStoreError::from(e)
            })?;
        Ok(tenant)
    }

    async fn domain_is_already_claimed(&self, domain: &str) -> Result<bool, TenantStoreError> {
        let count = self
            .tenants()
            .count_documents(doc! { HostKind::CustomDomain.field(): domain }, None)
            .await
            .map_err(|e| {
                tracing::error!("Custom domain claim check failed: {}", e);
                TenantStoreError::from(e)
            })?;
        Ok(count > 0)
    }

    async fn health_check(&self) -> Result<(), TenantStoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                TenantStoreError::from(e)
            })?;
        Ok(())
    }
}
