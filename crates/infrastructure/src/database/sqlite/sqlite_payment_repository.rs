use async_trait::async_trait;
use marketplace_domain::{entities::Payment, repositories::PaymentRepository};
use marketplace_errors::MarketplaceResult;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    database::mapping::{MappingHelpers, PAYMENT_FIELDS},
    error_handling::{EntityKind, RepositoryErrorHelpers, RepositoryOperation},
    repo_context,
};

/// 支付记录由外部支付系统写入
pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id))]
    pub async fn upsert(&self, payment: &Payment) -> MarketplaceResult<()> {
        let context = repo_context!(
            RepositoryOperation::Create,
            EntityKind::Payment,
            id = payment.id
        );

        sqlx::query(
            "INSERT OR REPLACE INTO payments (id, user_id, amount, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(payment.id.to_string())
        .bind(payment.user_id.to_string())
        .bind(payment.amount)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    #[instrument(skip(self), fields(payment_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Payment>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::Payment, id = id);

        let sql = format!(
            "SELECT {} FROM payments p WHERE p.id = ?",
            MappingHelpers::select_list("p", PAYMENT_FIELDS)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        row.as_ref()
            .map(|r| MappingHelpers::row_to_payment(r, "p"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::test_support::memory_pool;
    use chrono::Utc;

    #[tokio::test]
    async fn test_upsert_and_find_payment() {
        let pool = memory_pool().await;
        let repo = SqlitePaymentRepository::new(pool);
        let payment = Payment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: 120.5,
            created_at: Utc::now(),
        };
        repo.upsert(&payment).await.unwrap();

        let found = repo.find_by_id(payment.id).await.unwrap().unwrap();
        assert_eq!(found.amount, 120.5);
        assert_eq!(found.user_id, payment.user_id);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
