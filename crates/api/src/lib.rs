//! # Marketplace API
//!
//! 任务市场的HTTP接口，基于Axum构建。
//!
//! 认证由上游网关完成，调用方身份通过 `X-User-Id` / `X-User-Role` 请求头传入，
//! 见 [`auth::AuthenticatedUser`]。
//!
//! ## 端点
//!
//! - `GET /health` - 健康检查
//! - `POST /v1/tasks`, `GET /v1/tasks` - 创建 / 查询任务
//! - `GET /v1/tasks/home` - 首页任务流
//! - `GET /v1/tasks/admin` - 管理员任务列表
//! - `GET|PATCH|DELETE /v1/tasks/{id}` - 单个任务
//! - `POST /v1/submit-tasks`, `GET /v1/submit-tasks` - 报名 / 管理员查看全部报名
//! - `GET /v1/submit-tasks/mine` - 当前用户的报名
//! - `GET|PATCH /v1/submit-tasks/{id}` - 单个报名记录 / 管理员审核
//! - `POST /v1/submit-tasks/{id}/submit` - 提交任务证明
//! - `POST /v1/payment` - 关联支付
//!
//! ## 响应格式
//!
//! 成功：`{"success": true, "data": ..., "message": null, "timestamp": "..."}`
//!
//! 失败：`{"error": {"message": "...", "type": "...", "code": 404, "timestamp": "..."}}`

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::{extract::DefaultBodyLimit, Router};
use marketplace_config::ApiConfig;
use std::time::Duration;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, request_timeout, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig) -> Router {
    let timeout = Duration::from_secs(api_config.request_timeout_seconds);

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer(api_config))
            .layer(axum::middleware::from_fn(request_logging))
            .layer(axum::middleware::from_fn_with_state(timeout, request_timeout))
            .layer(DefaultBodyLimit::max(
                api_config.max_request_size_mb * 1024 * 1024,
            )),
    )
}
