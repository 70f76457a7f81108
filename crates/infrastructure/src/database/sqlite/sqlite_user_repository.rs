use async_trait::async_trait;
use marketplace_domain::{entities::User, repositories::UserRepository};
use marketplace_errors::MarketplaceResult;
use sqlx::SqlitePool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    database::mapping::{MappingHelpers, USER_FIELDS},
    error_handling::{EntityKind, RepositoryErrorHelpers, RepositoryOperation},
    repo_context,
};

/// 用户数据由外部系统维护，这里只提供读取和数据导入
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 导入或覆盖一条用户记录
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn upsert(&self, user: &User) -> MarketplaceResult<()> {
        let context = repo_context!(RepositoryOperation::Create, EntityKind::User, id = user.id);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users (id, full_name, email, image, role, nid_status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(user.role.as_str())
        .bind(user.nid_status.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<User>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::User, id = id);

        let sql = format!(
            "SELECT {} FROM users u WHERE u.id = ?",
            MappingHelpers::select_list("u", USER_FIELDS)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        if row.is_none() {
            debug!("用户不存在: ID {}", id);
        }
        row.as_ref()
            .map(|r| MappingHelpers::row_to_user(r, "u"))
            .transpose()
    }
}
