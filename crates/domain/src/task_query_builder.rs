use chrono::{DateTime, Utc};

use crate::entities::{SubmitTaskFilter, TaskFilter};
use crate::value_objects::{PageRequest, SortSpec};

/// Business logic for building task-related database queries.
/// This keeps the filter-to-SQL mapping out of the storage adapters.
pub struct TaskQueryBuilder;

impl TaskQueryBuilder {
    /// Build the WHERE clause for a task filter. Columns are qualified with `alias`.
    pub fn build_task_where(filter: &TaskFilter, alias: &str) -> (String, Vec<QueryParam>) {
        let mut clause = String::from("WHERE 1=1");
        let mut params = Vec::new();

        if let Some(user_id) = filter.user_id {
            clause.push_str(&format!(" AND {alias}.user_id = ?"));
            params.push(QueryParam::Text(user_id.to_string()));
        }

        if let Some(service_id) = filter.service_id {
            clause.push_str(&format!(" AND {alias}.service_id = ?"));
            params.push(QueryParam::Text(service_id.to_string()));
        }

        if let Some(task_type) = filter.task_type {
            clause.push_str(&format!(" AND {alias}.task_type = ?"));
            params.push(QueryParam::Text(task_type.as_str().to_string()));
        }

        if let Some(status) = filter.status {
            clause.push_str(&format!(" AND {alias}.status = ?"));
            params.push(QueryParam::Text(status.as_str().to_string()));
        }

        if let Some(name_pattern) = &filter.name_pattern {
            clause.push_str(&format!(" AND {alias}.name LIKE ?"));
            params.push(QueryParam::Text(format!("%{name_pattern}%")));
        }

        if let Some(min) = filter.quantity_above {
            clause.push_str(&format!(" AND {alias}.quantity > ?"));
            params.push(QueryParam::Int64(min));
        }

        if !filter.exclude_ids.is_empty() {
            let placeholders = vec!["?"; filter.exclude_ids.len()].join(", ");
            clause.push_str(&format!(" AND {alias}.id NOT IN ({placeholders})"));
            params.extend(
                filter
                    .exclude_ids
                    .iter()
                    .map(|id| QueryParam::Text(id.to_string())),
            );
        }

        if let Some(from) = filter.created_from {
            clause.push_str(&format!(" AND {alias}.created_at >= ?"));
            params.push(QueryParam::Timestamp(from));
        }

        if let Some(before) = filter.created_before {
            clause.push_str(&format!(" AND {alias}.created_at < ?"));
            params.push(QueryParam::Timestamp(before));
        }

        (clause, params)
    }

    pub fn build_submit_task_where(
        filter: &SubmitTaskFilter,
        alias: &str,
    ) -> (String, Vec<QueryParam>) {
        let mut clause = String::from("WHERE 1=1");
        let mut params = Vec::new();

        if let Some(user_id) = filter.user_id {
            clause.push_str(&format!(" AND {alias}.user_id = ?"));
            params.push(QueryParam::Text(user_id.to_string()));
        }

        if let Some(task_id) = filter.task_id {
            clause.push_str(&format!(" AND {alias}.task_id = ?"));
            params.push(QueryParam::Text(task_id.to_string()));
        }

        if let Some(status) = filter.status {
            clause.push_str(&format!(" AND {alias}.status = ?"));
            params.push(QueryParam::Text(status.as_str().to_string()));
        }

        (clause, params)
    }

    /// Build ORDER BY. An empty list falls back to newest first.
    pub fn build_order_by(sort: &[SortSpec], alias: &str) -> String {
        if sort.is_empty() {
            return format!("ORDER BY {alias}.created_at DESC");
        }
        let columns: Vec<String> = sort
            .iter()
            .map(|s| format!("{alias}.{} {}", s.field.column(), s.direction.as_sql()))
            .collect();
        format!("ORDER BY {}", columns.join(", "))
    }

    /// LIMIT/OFFSET clause and its two parameters.
    pub fn build_pagination(page: &PageRequest) -> (String, Vec<QueryParam>) {
        (
            "LIMIT ? OFFSET ?".to_string(),
            vec![QueryParam::Int64(page.limit), QueryParam::Int64(page.offset())],
        )
    }
}

/// Query parameter types for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int64(i64),
    Timestamp(DateTime<Utc>),
}
