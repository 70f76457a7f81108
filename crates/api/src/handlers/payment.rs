use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use marketplace_application::ProcessPaymentRequest;
use marketplace_domain::entities::UserRole;

use crate::{auth::AuthenticatedUser, error::ApiResult, response::success, routes::AppState};

/// 把已完成的外部支付关联到任务
pub async fn process_payment(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    payload: Result<Json<ProcessPaymentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(UserRole::Employee)?;
    let Json(request) = payload?;

    let task = state
        .payment_service
        .process_payment(caller.id, request)
        .await?;
    Ok(success(task))
}
