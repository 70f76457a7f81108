use async_trait::async_trait;
use marketplace_domain::{
    entities::{SubmitTask, SubmitTaskDetails, SubmitTaskFilter},
    repositories::SubmitTaskRepository,
    task_query_builder::TaskQueryBuilder,
    value_objects::PageRequest,
};
use marketplace_errors::MarketplaceResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    database::mapping::{MappingHelpers, SUBMIT_TASK_FIELDS, TASK_FIELDS, USER_FIELDS},
    error_handling::{EntityKind, RepositoryErrorHelpers, RepositoryOperation},
    repo_context,
};

pub struct SqliteSubmitTaskRepository {
    pool: SqlitePool,
}

impl SqliteSubmitTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn details_select() -> String {
        format!(
            "SELECT {}, {}, {} FROM submit_tasks st LEFT JOIN users u ON u.id = st.user_id LEFT JOIN tasks t ON t.id = st.task_id",
            MappingHelpers::select_list("st", SUBMIT_TASK_FIELDS),
            MappingHelpers::select_list("u", USER_FIELDS),
            MappingHelpers::select_list("t", TASK_FIELDS),
        )
    }

    fn row_to_details(row: &SqliteRow) -> MarketplaceResult<SubmitTaskDetails> {
        let user = if MappingHelpers::has_joined(row, "u")? {
            Some(MappingHelpers::row_to_user(row, "u")?)
        } else {
            None
        };
        let task = if MappingHelpers::has_joined(row, "t")? {
            Some(MappingHelpers::row_to_task(row, "t")?)
        } else {
            None
        };
        Ok(SubmitTaskDetails {
            submit_task: MappingHelpers::row_to_submit_task(row, "st")?,
            user,
            task,
        })
    }
}

#[async_trait]
impl SubmitTaskRepository for SqliteSubmitTaskRepository {
    #[instrument(skip(self, submit_task), fields(
        submit_task_id = %submit_task.id,
        task_id = %submit_task.task_id,
        user_id = %submit_task.user_id,
    ))]
    async fn create(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask> {
        let context = repo_context!(
            RepositoryOperation::Create,
            EntityKind::SubmitTask,
            id = submit_task.id
        );

        sqlx::query(
            r#"
            INSERT INTO submit_tasks (id, user_id, task_id, status, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submit_task.id.to_string())
        .bind(submit_task.user_id.to_string())
        .bind(submit_task.task_id.to_string())
        .bind(submit_task.status.as_str())
        .bind(&submit_task.image)
        .bind(submit_task.created_at)
        .bind(submit_task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context.clone(), e))?;

        RepositoryErrorHelpers::log_operation_success(
            context,
            &submit_task.entity_description(),
            None,
        );
        Ok(submit_task.clone())
    }

    #[instrument(skip(self), fields(submit_task_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<SubmitTask>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::SubmitTask, id = id);

        let sql = format!(
            "SELECT {} FROM submit_tasks st WHERE st.id = ?",
            MappingHelpers::select_list("st", SUBMIT_TASK_FIELDS)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        row.as_ref()
            .map(|r| MappingHelpers::row_to_submit_task(r, "st"))
            .transpose()
    }

    #[instrument(skip(self), fields(submit_task_id = %id))]
    async fn find_details_by_id(
        &self,
        id: Uuid,
    ) -> MarketplaceResult<Option<SubmitTaskDetails>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::SubmitTask, id = id);

        let sql = format!("{} WHERE st.id = ?", Self::details_select());
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        row.as_ref().map(Self::row_to_details).transpose()
    }

    #[instrument(skip(self, submit_task), fields(
        submit_task_id = %submit_task.id,
        status = %submit_task.status,
    ))]
    async fn update(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask> {
        let context = repo_context!(
            RepositoryOperation::Update,
            EntityKind::SubmitTask,
            id = submit_task.id
        );

        let result = sqlx::query(
            r#"
            UPDATE submit_tasks
            SET user_id = ?, task_id = ?, status = ?, image = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(submit_task.user_id.to_string())
        .bind(submit_task.task_id.to_string())
        .bind(submit_task.status.as_str())
        .bind(&submit_task.image)
        .bind(submit_task.updated_at)
        .bind(submit_task.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context.clone(), e))?;

        if result.rows_affected() == 0 {
            return Err(context.not_found());
        }

        RepositoryErrorHelpers::log_operation_success(
            context,
            &submit_task.entity_description(),
            Some(&format!("状态: {}", submit_task.status)),
        );
        Ok(submit_task.clone())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn task_ids_for_user(&self, user_id: Uuid) -> MarketplaceResult<Vec<Uuid>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::SubmitTask)
            .with_additional_info(format!("用户ID: {user_id}"));

        let rows = sqlx::query("SELECT DISTINCT task_id FROM submit_tasks WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        let ids = rows
            .iter()
            .map(|row| MappingHelpers::parse_uuid(row, "task_id"))
            .collect::<MarketplaceResult<Vec<_>>>()?;
        debug!("用户已报名任务数: {}", ids.len());
        Ok(ids)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &SubmitTaskFilter) -> MarketplaceResult<i64> {
        let context = repo_context!(RepositoryOperation::Count, EntityKind::SubmitTask)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let (where_clause, params) = TaskQueryBuilder::build_submit_task_where(filter, "st");
        let sql = format!("SELECT COUNT(*) AS total FROM submit_tasks st {where_clause}");
        let row = MappingHelpers::bind_params(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;
        Ok(row.try_get("total")?)
    }

    #[instrument(skip(self, filter), fields(page = page.page, limit = page.limit))]
    async fn find_page(
        &self,
        filter: &SubmitTaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<SubmitTaskDetails>> {
        let context = repo_context!(RepositoryOperation::Query, EntityKind::SubmitTask)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let (where_clause, mut params) = TaskQueryBuilder::build_submit_task_where(filter, "st");
        let (pagination, page_params) = TaskQueryBuilder::build_pagination(page);
        params.extend(page_params);

        let sql = format!(
            "{} {where_clause} ORDER BY st.created_at DESC {pagination}",
            Self::details_select()
        );
        let rows = MappingHelpers::bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        rows.iter().map(Self::row_to_details).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::test_support::{memory_pool, seed_service, seed_user, task_for};
    use crate::database::sqlite::SqliteTaskRepository;
    use chrono::{Duration, Utc};
    use marketplace_domain::entities::{SubmitTaskStatus, TaskType};
    use marketplace_domain::repositories::TaskRepository;

    #[tokio::test]
    async fn test_create_update_and_details() {
        let pool = memory_pool().await;
        let repo = SqliteSubmitTaskRepository::new(pool.clone());
        let tasks = SqliteTaskRepository::new(pool.clone());
        let user = seed_user(&pool).await;
        let service = seed_service(&pool, TaskType::Video).await;
        let task = tasks.create(&task_for(&user, &service)).await.unwrap();

        let mut record = SubmitTask::new(user.id, task.id);
        repo.create(&record).await.unwrap();

        record.status = SubmitTaskStatus::Submitted;
        record.image = Some("https://cdn/proof.png".to_string());
        repo.update(&record).await.unwrap();

        let details = repo.find_details_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(details.submit_task.status, SubmitTaskStatus::Submitted);
        assert_eq!(details.user.unwrap().id, user.id);
        assert_eq!(details.task.unwrap().id, task.id);

        // 删除任务不影响提交记录
        tasks.delete(task.id).await.unwrap();
        let details = repo.find_details_by_id(record.id).await.unwrap().unwrap();
        assert!(details.task.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let pool = memory_pool().await;
        let repo = SqliteSubmitTaskRepository::new(pool);
        let err = repo
            .update(&SubmitTask::new(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Submit Task not found");
    }

    #[tokio::test]
    async fn test_task_ids_and_paging() {
        let pool = memory_pool().await;
        let repo = SqliteSubmitTaskRepository::new(pool.clone());
        let user_id = Uuid::new_v4();
        let task_a = Uuid::new_v4();
        let task_b = Uuid::new_v4();

        let mut older = SubmitTask::new(user_id, task_a);
        older.created_at = Utc::now() - Duration::minutes(30);
        repo.create(&older).await.unwrap();
        let newer = SubmitTask::new(user_id, task_b);
        repo.create(&newer).await.unwrap();
        repo.create(&SubmitTask::new(Uuid::new_v4(), task_a))
            .await
            .unwrap();

        let mut ids = repo.task_ids_for_user(user_id).await.unwrap();
        ids.sort();
        let mut expected = vec![task_a, task_b];
        expected.sort();
        assert_eq!(ids, expected);

        let filter = SubmitTaskFilter {
            user_id: Some(user_id),
            status: Some(SubmitTaskStatus::Pending),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        let page = repo
            .find_page(&filter, &PageRequest::new(Some(1), Some(10)))
            .await
            .unwrap();
        assert_eq!(page[0].submit_task.id, newer.id);
        assert_eq!(page[1].submit_task.id, older.id);
        assert!(page[0].user.is_none());
        assert!(page[0].task.is_none());
    }
}
