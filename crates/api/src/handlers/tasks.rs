use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use marketplace_application::{CreateTaskRequest, UpdateTaskRequest};
use marketplace_domain::{
    entities::{TaskFilter, TaskStatus, TaskType, UserRole},
    value_objects::{HomeFeed, QueryOptionsOverride},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::ApiResult,
    response::{created, success, ApiResponse},
    routes::AppState,
};

/// 任务列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub user_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub name: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TaskQueryParams {
    fn into_parts(self) -> (TaskFilter, QueryOptionsOverride) {
        let filter = TaskFilter {
            user_id: self.user_id,
            service_id: self.service_id,
            task_type: self.task_type,
            status: self.status,
            name_pattern: self.name.filter(|n| !n.is_empty()),
            ..Default::default()
        };
        let options = QueryOptionsOverride {
            sort_by: self.sort_by,
            page: self.page,
            limit: self.limit,
        };
        (filter, options)
    }
}

/// 首页任务流参数，`type` 取值 `today` / `others`，其他值表示不按日期过滤
#[derive(Debug, Default, Deserialize)]
pub struct HomeQueryParams {
    #[serde(rename = "type")]
    pub feed: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminTaskQueryParams {
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 任务更新请求体：可修改字段加上可选的新图片
#[derive(Debug, Deserialize)]
pub struct UpdateTaskBody {
    #[serde(flatten)]
    pub changes: UpdateTaskRequest,
    pub image: Option<String>,
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Employee)?;
    let Json(request) = payload?;

    let task = state.task_service.create_task(caller.id, request).await?;
    Ok(created(task))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    params: Result<Query<TaskQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Query(params) = params?;

    let (filter, options) = params.into_parts();
    let page = state.task_service.query_tasks(filter, options).await?;
    Ok(success(page))
}

pub async fn task_home(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    params: Result<Query<HomeQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Query(params) = params?;

    let feed = HomeFeed::from_param(params.feed.as_deref());
    let page = state
        .task_service
        .task_home(caller.id, feed, params.page, params.limit)
        .await?;
    Ok(success(page))
}

pub async fn admin_tasks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    params: Result<Query<AdminTaskQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Admin)?;
    let Query(params) = params?;

    let page = state
        .task_service
        .get_admin_tasks(caller.id, params.task_type, params.page, params.limit)
        .await?;
    Ok(success(page))
}

pub async fn get_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Path(id) = id?;

    let task = state.task_service.get_task_by_id(id).await?;
    Ok(success(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Employee)?;
    let Path(id) = id?;
    let Json(body) = payload?;

    let task = state
        .task_service
        .update_task_by_id(id, body.changes, body.image)
        .await?;
    Ok(success(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Admin)?;
    let Path(id) = id?;

    let task = state.task_service.delete_task_by_id(id).await?;
    Ok(ApiResponse::success_with_message(task, "Task deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_into_filter() {
        let params: TaskQueryParams = serde_json::from_value(serde_json::json!({
            "type": "socialMedia",
            "status": "pending",
            "name": "",
            "sortBy": "price:asc",
            "limit": 5
        }))
        .unwrap();

        let (filter, options) = params.into_parts();
        assert_eq!(filter.task_type, Some(TaskType::SocialMedia));
        assert_eq!(filter.status, Some(TaskStatus::Pending));
        assert!(filter.name_pattern.is_none());
        assert_eq!(options.sort_by.as_deref(), Some("price:asc"));
        assert_eq!(options.limit, Some(5));
        assert!(options.page.is_none());
    }

    #[test]
    fn test_update_body_flattens_changes() {
        let body: UpdateTaskBody = serde_json::from_value(serde_json::json!({
            "name": "Renamed",
            "image": "https://cdn/new.png",
            "userId": "ignored"
        }))
        .unwrap();
        assert_eq!(body.changes.name.as_deref(), Some("Renamed"));
        assert_eq!(body.image.as_deref(), Some("https://cdn/new.png"));
    }
}
