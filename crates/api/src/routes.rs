use axum::{
    routing::{get, post},
    Router,
};
use marketplace_application::{PaymentService, TaskLifecycleService, TaskService};
use std::sync::Arc;

use crate::handlers::{
    health::health_check,
    payment::process_payment,
    submit_tasks::{
        get_submit_task, list_submit_tasks, my_submit_tasks, register_task, submit_task,
        update_submit_task,
    },
    tasks::{admin_tasks, create_task, delete_task, get_task, list_tasks, task_home, update_task},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_service: Arc<TaskService>,
    pub lifecycle_service: Arc<TaskLifecycleService>,
    pub payment_service: Arc<PaymentService>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 任务管理
        .route("/v1/tasks", get(list_tasks).post(create_task))
        .route("/v1/tasks/home", get(task_home))
        .route("/v1/tasks/admin", get(admin_tasks))
        .route(
            "/v1/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        // 任务报名与提交
        .route(
            "/v1/submit-tasks",
            get(list_submit_tasks).post(register_task),
        )
        .route("/v1/submit-tasks/mine", get(my_submit_tasks))
        .route(
            "/v1/submit-tasks/{id}",
            get(get_submit_task).patch(update_submit_task),
        )
        .route("/v1/submit-tasks/{id}/submit", post(submit_task))
        // 支付
        .route("/v1/payment", post(process_payment))
        .with_state(state)
}
