//! Shared SQLite row mapping helpers
//!
//! Joined queries select every column as `<alias>.<column> AS <alias>_<column>`,
//! so the same mapping functions serve plain and joined rows.

use chrono::{DateTime, Utc};
use marketplace_domain::entities::{
    NidStatus, Payment, Service, SubmitTask, SubmitTaskStatus, Task, TaskStatus, TaskType,
    Timeline, User, UserRole, UserSummary,
};
use marketplace_domain::task_query_builder::QueryParam;
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{query::Query, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

pub const TASK_FIELDS: &[&str] = &[
    "id",
    "name",
    "link",
    "user_id",
    "task_type",
    "service_id",
    "payment_id",
    "status",
    "timeline",
    "quantity",
    "price",
    "image",
    "created_at",
    "updated_at",
];

pub const SUBMIT_TASK_FIELDS: &[&str] = &[
    "id",
    "user_id",
    "task_id",
    "status",
    "image",
    "created_at",
    "updated_at",
];

pub const USER_FIELDS: &[&str] = &[
    "id",
    "full_name",
    "email",
    "image",
    "role",
    "nid_status",
    "created_at",
];

pub const SERVICE_FIELDS: &[&str] = &["id", "name", "service_type", "price", "created_at"];

pub const PAYMENT_FIELDS: &[&str] = &["id", "user_id", "amount", "created_at"];

/// Helper functions for parsing SQLite rows into domain entities
pub struct MappingHelpers;

impl MappingHelpers {
    /// `t.id AS t_id, t.name AS t_name, ...`
    pub fn select_list(alias: &str, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|f| format!("{alias}.{f} AS {alias}_{f}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn column(prefix: &str, field: &str) -> String {
        format!("{prefix}_{field}")
    }

    pub fn parse_uuid(row: &SqliteRow, column: &str) -> MarketplaceResult<Uuid> {
        let value: String = row.try_get(column)?;
        Uuid::parse_str(&value)
            .map_err(|e| MarketplaceError::Serialization(format!("解析UUID列 {column} 失败: {e}")))
    }

    pub fn parse_optional_uuid(row: &SqliteRow, column: &str) -> MarketplaceResult<Option<Uuid>> {
        let value: Option<String> = row.try_get(column)?;
        value
            .map(|v| {
                Uuid::parse_str(&v).map_err(|e| {
                    MarketplaceError::Serialization(format!("解析UUID列 {column} 失败: {e}"))
                })
            })
            .transpose()
    }

    /// 枚举以 `as_str()` 文本形式存储
    pub fn parse_enum<T>(row: &SqliteRow, column: &str) -> MarketplaceResult<T>
    where
        T: FromStr<Err = MarketplaceError>,
    {
        let value: String = row.try_get(column)?;
        value.parse()
    }

    pub fn parse_timeline(row: &SqliteRow, column: &str) -> MarketplaceResult<Option<Timeline>> {
        let value: Option<String> = row.try_get(column)?;
        value
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    MarketplaceError::Serialization(format!("解析时间线失败: {e}"))
                })
            })
            .transpose()
    }

    /// 连接查询中右表不存在时，其ID列为 NULL
    pub fn has_joined(row: &SqliteRow, prefix: &str) -> MarketplaceResult<bool> {
        let id: Option<String> = row.try_get(Self::column(prefix, "id").as_str())?;
        Ok(id.is_some())
    }

    pub fn row_to_task(row: &SqliteRow, prefix: &str) -> MarketplaceResult<Task> {
        let col = |f: &str| Self::column(prefix, f);
        Ok(Task {
            id: Self::parse_uuid(row, &col("id"))?,
            name: row.try_get(col("name").as_str())?,
            link: row.try_get(col("link").as_str())?,
            user_id: Self::parse_uuid(row, &col("user_id"))?,
            task_type: Self::parse_enum::<TaskType>(row, &col("task_type"))?,
            service_id: Self::parse_uuid(row, &col("service_id"))?,
            payment_id: Self::parse_optional_uuid(row, &col("payment_id"))?,
            status: Self::parse_enum::<TaskStatus>(row, &col("status"))?,
            timeline: Self::parse_timeline(row, &col("timeline"))?,
            quantity: row.try_get(col("quantity").as_str())?,
            price: row.try_get(col("price").as_str())?,
            image: row.try_get(col("image").as_str())?,
            created_at: row.try_get::<DateTime<Utc>, _>(col("created_at").as_str())?,
            updated_at: row.try_get::<DateTime<Utc>, _>(col("updated_at").as_str())?,
        })
    }

    pub fn row_to_submit_task(row: &SqliteRow, prefix: &str) -> MarketplaceResult<SubmitTask> {
        let col = |f: &str| Self::column(prefix, f);
        Ok(SubmitTask {
            id: Self::parse_uuid(row, &col("id"))?,
            user_id: Self::parse_uuid(row, &col("user_id"))?,
            task_id: Self::parse_uuid(row, &col("task_id"))?,
            status: Self::parse_enum::<SubmitTaskStatus>(row, &col("status"))?,
            image: row.try_get(col("image").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
            updated_at: row.try_get(col("updated_at").as_str())?,
        })
    }

    pub fn row_to_user(row: &SqliteRow, prefix: &str) -> MarketplaceResult<User> {
        let col = |f: &str| Self::column(prefix, f);
        Ok(User {
            id: Self::parse_uuid(row, &col("id"))?,
            full_name: row.try_get(col("full_name").as_str())?,
            email: row.try_get(col("email").as_str())?,
            image: row.try_get(col("image").as_str())?,
            role: Self::parse_enum::<UserRole>(row, &col("role"))?,
            nid_status: Self::parse_enum::<NidStatus>(row, &col("nid_status"))?,
            created_at: row.try_get(col("created_at").as_str())?,
        })
    }

    pub fn row_to_user_summary(row: &SqliteRow, prefix: &str) -> MarketplaceResult<UserSummary> {
        Ok(Self::row_to_user(row, prefix)?.summary())
    }

    pub fn row_to_service(row: &SqliteRow, prefix: &str) -> MarketplaceResult<Service> {
        let col = |f: &str| Self::column(prefix, f);
        Ok(Service {
            id: Self::parse_uuid(row, &col("id"))?,
            name: row.try_get(col("name").as_str())?,
            service_type: Self::parse_enum::<TaskType>(row, &col("service_type"))?,
            price: row.try_get(col("price").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
        })
    }

    pub fn row_to_payment(row: &SqliteRow, prefix: &str) -> MarketplaceResult<Payment> {
        let col = |f: &str| Self::column(prefix, f);
        Ok(Payment {
            id: Self::parse_uuid(row, &col("id"))?,
            user_id: Self::parse_uuid(row, &col("user_id"))?,
            amount: row.try_get(col("amount").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
        })
    }

    /// 按顺序绑定查询构建器生成的参数
    pub fn bind_params<'q>(
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
        params: &[QueryParam],
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for param in params {
            query = match param {
                QueryParam::Text(value) => query.bind(value.clone()),
                QueryParam::Int64(value) => query.bind(*value),
                QueryParam::Timestamp(value) => query.bind(*value),
            };
        }
        query
    }
}
