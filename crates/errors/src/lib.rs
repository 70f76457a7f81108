use thiserror::Error;

/// 任务市场统一错误类型
///
/// 每个变体都对应一个HTTP状态码（见 [`MarketplaceError::http_status_code`]），
/// API层据此生成错误响应。所有错误都直接返回给调用方，不做重试。
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("User not found")]
    UserNotFound,
    #[error("Service not found")]
    ServiceNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error("Submit Task not found")]
    SubmitTaskNotFound,
    #[error("Payment not found")]
    PaymentNotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database operation failed: {0}")]
    DatabaseOperation(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

impl MarketplaceError {
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MarketplaceError::UserNotFound
                | MarketplaceError::ServiceNotFound
                | MarketplaceError::TaskNotFound
                | MarketplaceError::SubmitTaskNotFound
                | MarketplaceError::PaymentNotFound
        )
    }

    /// 对应的HTTP状态码
    pub fn http_status_code(&self) -> u16 {
        match self {
            e if e.is_not_found() => 404,
            MarketplaceError::BadRequest(_) | MarketplaceError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// 机器可读的错误类型标识
    pub fn error_type(&self) -> &'static str {
        match self {
            MarketplaceError::UserNotFound => "USER_NOT_FOUND",
            MarketplaceError::ServiceNotFound => "SERVICE_NOT_FOUND",
            MarketplaceError::TaskNotFound => "TASK_NOT_FOUND",
            MarketplaceError::SubmitTaskNotFound => "SUBMIT_TASK_NOT_FOUND",
            MarketplaceError::PaymentNotFound => "PAYMENT_NOT_FOUND",
            MarketplaceError::BadRequest(_) => "BAD_REQUEST",
            MarketplaceError::Validation(_) => "VALIDATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// 面向最终用户的消息，内部错误不暴露细节
    pub fn user_message(&self) -> String {
        match self {
            MarketplaceError::Database(_)
            | MarketplaceError::DatabaseOperation(_)
            | MarketplaceError::Serialization(_)
            | MarketplaceError::Configuration(_)
            | MarketplaceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for MarketplaceError {
    fn from(err: serde_json::Error) -> Self {
        MarketplaceError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MarketplaceError {
    fn from(err: anyhow::Error) -> Self {
        MarketplaceError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for MarketplaceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        details.sort();
        MarketplaceError::Validation(details.join("; "))
    }
}

#[cfg(test)]
mod tests;
