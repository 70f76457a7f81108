use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marketplace_errors::MarketplaceError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("业务错误: {0}")]
    Marketplace(#[from] MarketplaceError),

    #[error("认证失败: {0}")]
    Unauthorized(String),

    #[error("权限不足")]
    Forbidden,

    #[error("请求格式错误: {0}")]
    MalformedRequest(String),

    #[error("请求超时")]
    Timeout,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Marketplace(err) => StatusCode::from_u16(err.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, error_type) = match &self {
            ApiError::Marketplace(err) => {
                if status.is_server_error() {
                    error!("请求处理失败: {}", err);
                }
                (err.user_message(), err.error_type())
            }
            ApiError::Unauthorized(msg) => (msg.clone(), "UNAUTHORIZED"),
            ApiError::Forbidden => ("Forbidden".to_string(), "FORBIDDEN"),
            ApiError::MalformedRequest(msg) => (msg.clone(), "BAD_REQUEST"),
            ApiError::Timeout => ("Request timed out".to_string(), "REQUEST_TIMEOUT"),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let response = ApiError::from(MarketplaceError::TaskNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Task not found");
        assert_eq!(body["error"]["type"], "TASK_NOT_FOUND");
        assert_eq!(body["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response =
            ApiError::from(MarketplaceError::bad_request("Already submitted")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Already submitted");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            ApiError::from(MarketplaceError::internal("pool exhausted")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[test]
    fn test_identity_errors() {
        assert_eq!(
            ApiError::Unauthorized("missing".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
    }
}
