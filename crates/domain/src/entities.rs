use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use marketplace_errors::MarketplaceError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务类型，创建任务时从所属服务复制
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskType {
    #[serde(rename = "socialMedia")]
    SocialMedia,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "corporate")]
    Corporate,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::SocialMedia => "socialMedia",
            TaskType::Video => "video",
            TaskType::Corporate => "corporate",
        }
    }
}

impl FromStr for TaskType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socialMedia" => Ok(TaskType::SocialMedia),
            "video" => Ok(TaskType::Video),
            "corporate" => Ok(TaskType::Corporate),
            _ => Err(MarketplaceError::validation_error(format!(
                "Invalid task type: {s}"
            ))),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(MarketplaceError::validation_error(format!(
                "Invalid task status: {s}"
            ))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务报名/提交记录状态
///
/// 用户提交作品只能从 `Pending` 进入 `Submitted`，之后的审核状态由管理员设置。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmitTaskStatus {
    #[default]
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl SubmitTaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitTaskStatus::Pending => "pending",
            SubmitTaskStatus::Submitted => "submitted",
            SubmitTaskStatus::Approved => "approved",
            SubmitTaskStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for SubmitTaskStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmitTaskStatus::Pending),
            "submitted" => Ok(SubmitTaskStatus::Submitted),
            "approved" => Ok(SubmitTaskStatus::Approved),
            "rejected" => Ok(SubmitTaskStatus::Rejected),
            _ => Err(MarketplaceError::validation_error(format!(
                "Invalid submit task status: {s}"
            ))),
        }
    }
}

impl fmt::Display for SubmitTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 身份证(NID)审核状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NidStatus {
    #[default]
    Unsubmitted,
    Pending,
    Approved,
    Rejected,
}

impl NidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NidStatus::Unsubmitted => "unsubmitted",
            NidStatus::Pending => "pending",
            NidStatus::Approved => "approved",
            NidStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for NidStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsubmitted" => Ok(NidStatus::Unsubmitted),
            "pending" => Ok(NidStatus::Pending),
            "approved" => Ok(NidStatus::Approved),
            "rejected" => Ok(NidStatus::Rejected),
            _ => Err(MarketplaceError::validation_error(format!(
                "Invalid NID status: {s}"
            ))),
        }
    }
}

/// 用户角色，按权限从低到高排序
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Employee,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Employee => "employee",
            UserRole::Admin => "admin",
        }
    }

    pub fn satisfies(&self, required: UserRole) -> bool {
        *self >= required
    }
}

impl FromStr for UserRole {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "employee" => Ok(UserRole::Employee),
            "admin" => Ok(UserRole::Admin),
            _ => Err(MarketplaceError::validation_error(format!(
                "Invalid user role: {s}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Timeline {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub service_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: TaskStatus,
    pub timeline: Option<Timeline>,
    /// 剩余可报名名额，仅用于首页过滤，不会被扣减
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 为某个服务创建新任务，任务类型始终取自服务
    pub fn new(name: String, link: String, user_id: Uuid, service: &Service) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            link,
            user_id,
            task_type: service.service_type,
            service_id: service.id,
            payment_id: None,
            status: TaskStatus::Pending,
            timeline: None,
            quantity: None,
            price: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.quantity.is_some_and(|q| q > 0)
    }

    pub fn entity_description(&self) -> String {
        format!("任务 '{}' (ID: {}, 类型: {})", self.name, self.id, self.task_type)
    }
}

/// 用户针对某个任务的报名/提交记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub status: SubmitTaskStatus,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmitTask {
    pub fn new(user_id: Uuid, task_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            task_id,
            status: SubmitTaskStatus::Pending,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmitTaskStatus::Pending
    }

    pub fn entity_description(&self) -> String {
        format!("提交记录 (ID: {}, 任务ID: {})", self.id, self.task_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: UserRole,
    pub nid_status: NidStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_nid_approved(&self) -> bool {
        self.nid_status == NidStatus::Approved
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            image: self.image.clone(),
        }
    }
}

/// 列表展开时只返回的用户字段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: TaskType,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// 展开了创建者与服务的任务，引用失效时对应字段为 `None`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub user: Option<UserSummary>,
    pub service: Option<Service>,
}

/// 管理员列表视图：任务与用户、服务内连接
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminTaskView {
    #[serde(flatten)]
    pub task: Task,
    pub user: User,
    pub service: Service,
}

/// 展开了用户与任务的提交记录，任务被删除后 `task` 为 `None`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitTaskDetails {
    #[serde(flatten)]
    pub submit_task: SubmitTask,
    pub user: Option<User>,
    pub task: Option<Task>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub name_pattern: Option<String>,
    /// 仅返回 `quantity` 严格大于该值的任务
    pub quantity_above: Option<i64>,
    pub exclude_ids: Vec<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.user_id.is_some_and(|id| id != task.user_id) {
            return false;
        }
        if self.service_id.is_some_and(|id| id != task.service_id) {
            return false;
        }
        if self.task_type.is_some_and(|t| t != task.task_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if let Some(pattern) = &self.name_pattern {
            if !task.name.to_lowercase().contains(&pattern.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.quantity_above {
            if !task.quantity.is_some_and(|q| q > min) {
                return false;
            }
        }
        if self.exclude_ids.contains(&task.id) {
            return false;
        }
        if self.created_from.is_some_and(|from| task.created_at < from) {
            return false;
        }
        if self.created_before.is_some_and(|before| task.created_at >= before) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmitTaskFilter {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<SubmitTaskStatus>,
}

impl SubmitTaskFilter {
    pub fn matches(&self, submit_task: &SubmitTask) -> bool {
        self.user_id.is_none_or(|id| id == submit_task.user_id)
            && self.task_id.is_none_or(|id| id == submit_task.task_id)
            && self.status.is_none_or(|s| s == submit_task.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service(service_type: TaskType) -> Service {
        Service {
            id: Uuid::new_v4(),
            name: "YouTube views".to_string(),
            service_type,
            price: Some(2.5),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_type_follows_service() {
        let svc = service(TaskType::Video);
        let task = Task::new(
            "Watch".to_string(),
            "https://example.com/v".to_string(),
            Uuid::new_v4(),
            &svc,
        );
        assert_eq!(task.task_type, TaskType::Video);
        assert_eq!(task.service_id, svc.id);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_enum_round_trip_strings() {
        assert_eq!("socialMedia".parse::<TaskType>().unwrap(), TaskType::SocialMedia);
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(
            "submitted".parse::<SubmitTaskStatus>().unwrap(),
            SubmitTaskStatus::Submitted
        );
        assert!("SocialMedia".parse::<TaskType>().is_err());
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_serializes_type_field() {
        let task = Task::new(
            "Like".to_string(),
            "https://example.com".to_string(),
            Uuid::new_v4(),
            &service(TaskType::SocialMedia),
        );
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "socialMedia");
        assert_eq!(json["status"], "pending");
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Admin.satisfies(UserRole::Employee));
        assert!(UserRole::Employee.satisfies(UserRole::User));
        assert!(!UserRole::User.satisfies(UserRole::Employee));
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn test_task_filter_matches() {
        let mut task = Task::new(
            "Share post".to_string(),
            "https://example.com".to_string(),
            Uuid::new_v4(),
            &service(TaskType::SocialMedia),
        );
        task.quantity = Some(3);

        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            quantity_above: Some(0),
            name_pattern: Some("share".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&task));

        let excluded = TaskFilter {
            exclude_ids: vec![task.id],
            ..Default::default()
        };
        assert!(!excluded.matches(&task));

        task.quantity = Some(0);
        assert!(!filter.matches(&task));
        task.quantity = None;
        assert!(!filter.matches(&task));
    }

    #[test]
    fn test_task_filter_created_window() {
        let mut task = Task::new(
            "Old".to_string(),
            "https://example.com".to_string(),
            Uuid::new_v4(),
            &service(TaskType::Corporate),
        );
        let boundary = Utc::now();
        task.created_at = boundary - Duration::hours(1);

        let today = TaskFilter {
            created_from: Some(boundary),
            ..Default::default()
        };
        let others = TaskFilter {
            created_before: Some(boundary),
            ..Default::default()
        };
        assert!(!today.matches(&task));
        assert!(others.matches(&task));

        task.created_at = boundary;
        assert!(today.matches(&task));
        assert!(!others.matches(&task));
    }

    #[test]
    fn test_submit_task_filter() {
        let submit = SubmitTask::new(Uuid::new_v4(), Uuid::new_v4());
        let filter = SubmitTaskFilter {
            user_id: Some(submit.user_id),
            status: Some(SubmitTaskStatus::Pending),
            ..Default::default()
        };
        assert!(filter.matches(&submit));
        let other = SubmitTaskFilter {
            status: Some(SubmitTaskStatus::Submitted),
            ..Default::default()
        };
        assert!(!other.matches(&submit));
    }
}
