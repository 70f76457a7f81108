//! 请求数据传输对象
//!
//! 字段白名单：请求体中的未知字段（如 `userId`、`type`、`paymentId`）会被忽略，
//! 不会写入实体。

use marketplace_domain::entities::{SubmitTaskStatus, TaskStatus, Timeline};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// 时间线的开始时间不能晚于结束时间
pub fn validate_timeline(timeline: &Timeline) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (timeline.start, timeline.end) {
        if start > end {
            return Err(ValidationError::new("timeline_order")
                .with_message("timeline start must not be after end".into()));
        }
    }
    Ok(())
}

/// 任务创建请求，任务类型由服务决定，不接受客户端传入
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(url(message = "link must be a valid URL"))]
    pub link: String,
    pub service_id: Uuid,
    #[validate(custom(function = "validate_timeline"))]
    pub timeline: Option<Timeline>,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub image: Option<String>,
}

/// 任务更新请求，只允许修改以下字段
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(url(message = "link must be a valid URL"))]
    pub link: Option<String>,
    pub status: Option<TaskStatus>,
    #[validate(custom(function = "validate_timeline"))]
    pub timeline: Option<Timeline>,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.link.is_none()
            && self.status.is_none()
            && self.timeline.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTaskRequest {
    pub task_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskRequest {
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

/// 管理员审核提交记录，只允许修改状态和图片
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTaskUpdateRequest {
    pub status: Option<SubmitTaskStatus>,
    #[validate(length(min = 1, message = "image must not be empty"))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub task_id: Uuid,
    pub payment_id: Uuid,
}
