use async_trait::async_trait;
use marketplace_domain::{entities::Service, repositories::ServiceRepository};
use marketplace_errors::MarketplaceResult;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    database::mapping::{MappingHelpers, SERVICE_FIELDS},
    error_handling::{EntityKind, RepositoryErrorHelpers, RepositoryOperation},
    repo_context,
};

pub struct SqliteServiceRepository {
    pool: SqlitePool,
}

impl SqliteServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, service), fields(service_id = %service.id))]
    pub async fn upsert(&self, service: &Service) -> MarketplaceResult<()> {
        let context = repo_context!(
            RepositoryOperation::Create,
            EntityKind::Service,
            id = service.id
        );

        sqlx::query(
            "INSERT OR REPLACE INTO services (id, name, service_type, price, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(service.service_type.as_str())
        .bind(service.price)
        .bind(service.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;
        Ok(())
    }
}

#[async_trait]
impl ServiceRepository for SqliteServiceRepository {
    #[instrument(skip(self), fields(service_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Service>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::Service, id = id);

        let sql = format!(
            "SELECT {} FROM services s WHERE s.id = ?",
            MappingHelpers::select_list("s", SERVICE_FIELDS)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        row.as_ref()
            .map(|r| MappingHelpers::row_to_service(r, "s"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::test_support::{memory_pool, seed_service};
    use marketplace_domain::entities::TaskType;

    #[tokio::test]
    async fn test_find_service() {
        let pool = memory_pool().await;
        let repo = SqliteServiceRepository::new(pool.clone());
        let service = seed_service(&pool, TaskType::Corporate).await;

        let found = repo.find_by_id(service.id).await.unwrap().unwrap();
        assert_eq!(found.service_type, TaskType::Corporate);
        assert_eq!(found.price, service.price);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
