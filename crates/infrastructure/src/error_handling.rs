//! Error handling for repository operations with rich context
//!
//! Every repository call builds an [`OperationContext`] (operation, entity kind,
//! optional entity id) so database failures are logged and reported with the
//! entity they concern.

use chrono::{DateTime, Utc};
use marketplace_errors::MarketplaceError;
use sqlx::Error as SqlxError;
use std::fmt;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Operation context for repository operations
#[derive(Debug, Clone, Copy)]
pub enum RepositoryOperation {
    Create,
    Read,
    Update,
    Delete,
    Query,
    Count,
    Migrate,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryOperation::Create => write!(f, "创建"),
            RepositoryOperation::Read => write!(f, "查询"),
            RepositoryOperation::Update => write!(f, "更新"),
            RepositoryOperation::Delete => write!(f, "删除"),
            RepositoryOperation::Query => write!(f, "分页查询"),
            RepositoryOperation::Count => write!(f, "统计"),
            RepositoryOperation::Migrate => write!(f, "迁移"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    SubmitTask,
    User,
    Service,
    Payment,
    Schema,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "任务"),
            EntityKind::SubmitTask => write!(f, "提交记录"),
            EntityKind::User => write!(f, "用户"),
            EntityKind::Service => write!(f, "服务"),
            EntityKind::Payment => write!(f, "支付记录"),
            EntityKind::Schema => write!(f, "数据库结构"),
        }
    }
}

/// Context information for a single repository call
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: RepositoryOperation,
    pub entity: EntityKind,
    pub entity_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub additional_info: Option<String>,
}

impl OperationContext {
    pub fn new(operation: RepositoryOperation, entity: EntityKind) -> Self {
        Self {
            operation,
            entity,
            entity_id: None,
            timestamp: Utc::now(),
            additional_info: None,
        }
    }

    pub fn with_entity_id(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn with_additional_info(mut self, info: String) -> Self {
        self.additional_info = Some(info);
        self
    }

    pub fn entity_description(&self) -> String {
        match self.entity_id {
            Some(id) => format!("{} (ID: {})", self.entity, id),
            None => self.entity.to_string(),
        }
    }

    /// 实体不存在时对应的领域错误
    pub fn not_found(&self) -> MarketplaceError {
        match self.entity {
            EntityKind::Task => MarketplaceError::TaskNotFound,
            EntityKind::SubmitTask => MarketplaceError::SubmitTaskNotFound,
            EntityKind::User => MarketplaceError::UserNotFound,
            EntityKind::Service => MarketplaceError::ServiceNotFound,
            EntityKind::Payment => MarketplaceError::PaymentNotFound,
            EntityKind::Schema => MarketplaceError::internal("数据库结构不存在"),
        }
    }
}

/// Enhanced error helpers for repository operations
pub struct RepositoryErrorHelpers;

impl RepositoryErrorHelpers {
    /// Create a database error with operation context
    #[instrument(skip_all, fields(
        operation = %context.operation,
        entity = %context.entity,
        entity_id = ?context.entity_id,
        timestamp = %context.timestamp,
    ))]
    pub fn database_error(context: OperationContext, error: SqlxError) -> MarketplaceError {
        let entity_desc = context.entity_description();
        let operation_desc = context.operation.to_string();

        let error_msg = match &error {
            SqlxError::Database(db_error) => {
                if db_error.is_unique_violation() {
                    format!("{operation_desc}{entity_desc}时发生唯一约束冲突: {db_error}")
                } else {
                    format!("{operation_desc}{entity_desc}时发生数据库错误: {db_error}")
                }
            }
            SqlxError::PoolClosed => {
                format!("{operation_desc}{entity_desc}时数据库连接池已关闭")
            }
            SqlxError::PoolTimedOut => {
                format!("{operation_desc}{entity_desc}时数据库连接池超时")
            }
            SqlxError::Io(io_error) => {
                format!("{operation_desc}{entity_desc}时发生I/O错误: {io_error}")
            }
            _ => {
                format!("{operation_desc}{entity_desc}时发生未知数据库错误: {error}")
            }
        };

        match &context.additional_info {
            Some(info) => error!(error = %error, additional_info = %info, "{}", error_msg),
            None => error!(error = %error, "{}", error_msg),
        }
        MarketplaceError::database_error(error_msg)
    }

    /// Create a serialization error for columns that hold JSON
    pub fn serialization_error(
        context: OperationContext,
        error: impl fmt::Display,
    ) -> MarketplaceError {
        let error_msg = format!(
            "{}{}时序列化失败: {}",
            context.operation,
            context.entity_description(),
            error
        );
        error!("{}", error_msg);
        MarketplaceError::Serialization(error_msg)
    }

    /// Log successful repository operation
    #[instrument(skip_all, fields(
        operation = %context.operation,
        entity_desc = %entity_desc,
        timestamp = %context.timestamp,
    ))]
    pub fn log_operation_success(
        context: OperationContext,
        entity_desc: &str,
        additional_info: Option<&str>,
    ) {
        let base_msg = format!("{}{}成功", context.operation, entity_desc);

        if let Some(info) = additional_info {
            info!("{}: {}", base_msg, info);
        } else {
            info!("{}", base_msg);
        }
    }
}

/// Macro for creating repository operation context easily
#[macro_export]
macro_rules! repo_context {
    ($operation:expr, $entity:expr) => {
        $crate::error_handling::OperationContext::new($operation, $entity)
    };
    ($operation:expr, $entity:expr, id = $id:expr) => {
        $crate::error_handling::OperationContext::new($operation, $entity).with_entity_id($id)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_description() {
        let id = Uuid::new_v4();
        let context = repo_context!(RepositoryOperation::Read, EntityKind::Task, id = id);
        assert_eq!(context.entity_description(), format!("任务 (ID: {id})"));

        let context = repo_context!(RepositoryOperation::Count, EntityKind::SubmitTask);
        assert_eq!(context.entity_description(), "提交记录");
    }

    #[test]
    fn test_not_found_maps_entity() {
        let context = repo_context!(RepositoryOperation::Update, EntityKind::SubmitTask);
        assert!(matches!(
            context.not_found(),
            MarketplaceError::SubmitTaskNotFound
        ));
        let context = repo_context!(RepositoryOperation::Update, EntityKind::Task);
        assert_eq!(context.not_found().to_string(), "Task not found");
    }

    #[test]
    fn test_database_error_is_internal() {
        let context = repo_context!(RepositoryOperation::Create, EntityKind::Task);
        let err = RepositoryErrorHelpers::database_error(context, SqlxError::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert!(err.to_string().contains("连接池已关闭"));
        assert_eq!(err.user_message(), "Internal server error");
    }
}
