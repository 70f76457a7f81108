use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use marketplace_application::{RegisterTaskRequest, SubmitTaskRequest, SubmitTaskUpdateRequest};
use marketplace_domain::entities::{SubmitTaskStatus, UserRole};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::ApiResult,
    response::{created, success},
    routes::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SubmitTaskQueryParams {
    pub status: Option<SubmitTaskStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 报名任务
pub async fn register_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    payload: Result<Json<RegisterTaskRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Json(request) = payload?;

    let submit_task = state
        .lifecycle_service
        .task_register(caller.id, request)
        .await?;
    Ok(created(submit_task))
}

/// 当前用户的报名记录
pub async fn my_submit_tasks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    params: Result<Query<SubmitTaskQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Query(params) = params?;

    let page = state
        .lifecycle_service
        .get_employee_tasks(caller.id, params.status, params.page, params.limit)
        .await?;
    Ok(success(page))
}

pub async fn list_submit_tasks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    params: Result<Query<SubmitTaskQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Admin)?;
    let Query(params) = params?;

    let page = state
        .lifecycle_service
        .get_submitted_tasks(params.status, params.page, params.limit)
        .await?;
    Ok(success(page))
}

pub async fn get_submit_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Path(id) = id?;

    let details = state.lifecycle_service.get_register_single_task(id).await?;
    Ok(success(details))
}

/// 提交任务证明
pub async fn submit_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::User)?;
    let Path(id) = id?;
    let Json(request) = payload?;

    let submit_task = state
        .lifecycle_service
        .task_submit(caller.id, id, request)
        .await?;
    Ok(success(submit_task))
}

/// 管理员审核
pub async fn update_submit_task(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitTaskUpdateRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Admin)?;
    let Path(id) = id?;
    let Json(request) = payload?;

    let submit_task = state
        .lifecycle_service
        .submit_task_update(id, request)
        .await?;
    Ok(success(submit_task))
}
