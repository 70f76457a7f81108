use async_trait::async_trait;
use marketplace_domain::{
    entities::{AdminTaskView, Task, TaskDetails, TaskFilter},
    repositories::TaskRepository,
    task_query_builder::TaskQueryBuilder,
    value_objects::{PageRequest, SortSpec},
};
use marketplace_errors::MarketplaceResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    database::mapping::{MappingHelpers, SERVICE_FIELDS, TASK_FIELDS, USER_FIELDS},
    error_handling::{EntityKind, RepositoryErrorHelpers, RepositoryOperation},
    repo_context,
};

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn details_select(join: &str) -> String {
        format!(
            "SELECT {}, {}, {} FROM tasks t {join} users u ON u.id = t.user_id {join} services s ON s.id = t.service_id",
            MappingHelpers::select_list("t", TASK_FIELDS),
            MappingHelpers::select_list("u", USER_FIELDS),
            MappingHelpers::select_list("s", SERVICE_FIELDS),
        )
    }

    fn row_to_details(row: &SqliteRow) -> MarketplaceResult<TaskDetails> {
        let user = if MappingHelpers::has_joined(row, "u")? {
            Some(MappingHelpers::row_to_user_summary(row, "u")?)
        } else {
            None
        };
        let service = if MappingHelpers::has_joined(row, "s")? {
            Some(MappingHelpers::row_to_service(row, "s")?)
        } else {
            None
        };
        Ok(TaskDetails {
            task: MappingHelpers::row_to_task(row, "t")?,
            user,
            service,
        })
    }

    fn row_to_admin_view(row: &SqliteRow) -> MarketplaceResult<AdminTaskView> {
        Ok(AdminTaskView {
            task: MappingHelpers::row_to_task(row, "t")?,
            user: MappingHelpers::row_to_user(row, "u")?,
            service: MappingHelpers::row_to_service(row, "s")?,
        })
    }

    fn timeline_json(task: &Task) -> MarketplaceResult<Option<String>> {
        task.timeline
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| {
                RepositoryErrorHelpers::serialization_error(
                    repo_context!(RepositoryOperation::Update, EntityKind::Task, id = task.id),
                    e,
                )
            })
    }

    async fn count_where(&self, filter: &TaskFilter, join: Option<&str>) -> MarketplaceResult<i64> {
        let context = repo_context!(RepositoryOperation::Count, EntityKind::Task)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let (where_clause, params) = TaskQueryBuilder::build_task_where(filter, "t");
        let from = match join {
            Some(join) => format!(
                "tasks t {join} users u ON u.id = t.user_id {join} services s ON s.id = t.service_id"
            ),
            None => "tasks t".to_string(),
        };
        let sql = format!("SELECT COUNT(*) AS total FROM {from} {where_clause}");

        let row = MappingHelpers::bind_params(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;
        Ok(row.try_get("total")?)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(
        task_id = %task.id,
        task_name = %task.name,
        task_type = %task.task_type,
    ))]
    async fn create(&self, task: &Task) -> MarketplaceResult<Task> {
        let context = repo_context!(RepositoryOperation::Create, EntityKind::Task, id = task.id);
        let timeline = Self::timeline_json(task)?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, name, link, user_id, task_type, service_id, payment_id, status, timeline, quantity, price, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.name)
        .bind(&task.link)
        .bind(task.user_id.to_string())
        .bind(task.task_type.as_str())
        .bind(task.service_id.to_string())
        .bind(task.payment_id.map(|id| id.to_string()))
        .bind(task.status.as_str())
        .bind(timeline)
        .bind(task.quantity)
        .bind(task.price)
        .bind(&task.image)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context.clone(), e))?;

        RepositoryErrorHelpers::log_operation_success(
            context,
            &task.entity_description(),
            Some(&format!("服务ID: {}", task.service_id)),
        );
        Ok(task.clone())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Task>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::Task, id = id);

        let sql = format!(
            "SELECT {} FROM tasks t WHERE t.id = ?",
            MappingHelpers::select_list("t", TASK_FIELDS)
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        match row {
            Some(row) => {
                let task = MappingHelpers::row_to_task(&row, "t")?;
                debug!("查询任务成功: ID {}, 名称: {}", task.id, task.name);
                Ok(Some(task))
            }
            None => {
                debug!("查询任务不存在: ID {}", id);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn find_details_by_id(&self, id: Uuid) -> MarketplaceResult<Option<TaskDetails>> {
        let context = repo_context!(RepositoryOperation::Read, EntityKind::Task, id = id);

        let sql = format!("{} WHERE t.id = ?", Self::details_select("LEFT JOIN"));
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        row.as_ref().map(Self::row_to_details).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, task_name = %task.name))]
    async fn update(&self, task: &Task) -> MarketplaceResult<Task> {
        let context = repo_context!(RepositoryOperation::Update, EntityKind::Task, id = task.id);
        let timeline = Self::timeline_json(task)?;

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET name = ?, link = ?, user_id = ?, task_type = ?, service_id = ?, payment_id = ?,
                status = ?, timeline = ?, quantity = ?, price = ?, image = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.name)
        .bind(&task.link)
        .bind(task.user_id.to_string())
        .bind(task.task_type.as_str())
        .bind(task.service_id.to_string())
        .bind(task.payment_id.map(|id| id.to_string()))
        .bind(task.status.as_str())
        .bind(timeline)
        .bind(task.quantity)
        .bind(task.price)
        .bind(&task.image)
        .bind(task.updated_at)
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryErrorHelpers::database_error(context.clone(), e))?;

        if result.rows_affected() == 0 {
            return Err(context.not_found());
        }

        RepositoryErrorHelpers::log_operation_success(
            context,
            &task.entity_description(),
            Some(&format!("状态: {}", task.status)),
        );
        Ok(task.clone())
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: Uuid) -> MarketplaceResult<Option<Task>> {
        let Some(task) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let context = repo_context!(RepositoryOperation::Delete, EntityKind::Task, id = id);
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context.clone(), e))?;

        // 并发删除时另一方已经删掉了
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        RepositoryErrorHelpers::log_operation_success(context, &task.entity_description(), None);
        Ok(Some(task))
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &TaskFilter) -> MarketplaceResult<i64> {
        self.count_where(filter, None).await
    }

    #[instrument(skip(self, filter, sort), fields(page = page.page, limit = page.limit))]
    async fn find_page(
        &self,
        filter: &TaskFilter,
        sort: &[SortSpec],
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<TaskDetails>> {
        let context = repo_context!(RepositoryOperation::Query, EntityKind::Task)
            .with_additional_info(format!("过滤器: {filter:?}"));

        let (where_clause, mut params) = TaskQueryBuilder::build_task_where(filter, "t");
        let order_by = TaskQueryBuilder::build_order_by(sort, "t");
        let (pagination, page_params) = TaskQueryBuilder::build_pagination(page);
        params.extend(page_params);

        let sql = format!(
            "{} {where_clause} {order_by} {pagination}",
            Self::details_select("LEFT JOIN")
        );
        let rows = MappingHelpers::bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        let tasks = rows
            .iter()
            .map(Self::row_to_details)
            .collect::<MarketplaceResult<Vec<_>>>()?;
        debug!("分页查询任务: 返回 {} 条", tasks.len());
        Ok(tasks)
    }

    #[instrument(skip(self, filter))]
    async fn count_with_owner(&self, filter: &TaskFilter) -> MarketplaceResult<i64> {
        self.count_where(filter, Some("INNER JOIN")).await
    }

    #[instrument(skip(self, filter), fields(page = page.page, limit = page.limit))]
    async fn find_page_with_owner(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<AdminTaskView>> {
        let context = repo_context!(RepositoryOperation::Query, EntityKind::Task)
            .with_additional_info(format!("管理员列表, 过滤器: {filter:?}"));

        let (where_clause, mut params) = TaskQueryBuilder::build_task_where(filter, "t");
        let order_by = TaskQueryBuilder::build_order_by(&[SortSpec::newest_first()], "t");
        let (pagination, page_params) = TaskQueryBuilder::build_pagination(page);
        params.extend(page_params);

        let sql = format!(
            "{} {where_clause} {order_by} {pagination}",
            Self::details_select("INNER JOIN")
        );
        let rows = MappingHelpers::bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryErrorHelpers::database_error(context, e))?;

        rows.iter().map(Self::row_to_admin_view).collect()
    }
}
