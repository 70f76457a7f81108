use chrono::Utc;
use marketplace_domain::entities::{
    SubmitTask, SubmitTaskDetails, SubmitTaskFilter, SubmitTaskStatus, User,
};
use marketplace_domain::repositories::{SubmitTaskRepository, TaskRepository, UserRepository};
use marketplace_domain::value_objects::{Page, PageRequest};
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{RegisterTaskRequest, SubmitTaskRequest, SubmitTaskUpdateRequest};

/// 任务报名与提交流程
///
/// 状态流转：`pending --提交--> submitted --管理员审核--> 任意状态`。
/// 只有第一步有守卫，管理员更新不校验转换。
pub struct TaskLifecycleService {
    submit_task_repository: Arc<dyn SubmitTaskRepository>,
    task_repository: Arc<dyn TaskRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl TaskLifecycleService {
    pub fn new(
        submit_task_repository: Arc<dyn SubmitTaskRepository>,
        task_repository: Arc<dyn TaskRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            submit_task_repository,
            task_repository,
            user_repository,
        }
    }

    async fn require_user(&self, user_id: Uuid) -> MarketplaceResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(MarketplaceError::UserNotFound)
    }

    /// 报名任务，用户的NID必须已通过审核
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    pub async fn task_register(
        &self,
        user_id: Uuid,
        request: RegisterTaskRequest,
    ) -> MarketplaceResult<SubmitTask> {
        request.validate()?;

        let user = self.require_user(user_id).await?;
        if !user.is_nid_approved() {
            warn!("NID未通过审核，拒绝报名: user_id={}, nid_status={}", user.id, user.nid_status.as_str());
            return Err(MarketplaceError::bad_request(
                "Please submit NID for approval",
            ));
        }

        self.task_repository
            .find_by_id(request.task_id)
            .await?
            .ok_or(MarketplaceError::TaskNotFound)?;

        let submit_task = SubmitTask::new(user.id, request.task_id);
        let created = self.submit_task_repository.create(&submit_task).await?;
        info!("报名任务成功: {}", created.entity_description());
        Ok(created)
    }

    /// 提交任务成果，每条记录只能由报名用户提交一次
    #[instrument(skip(self, request))]
    pub async fn task_submit(
        &self,
        user_id: Uuid,
        submit_task_id: Uuid,
        request: SubmitTaskRequest,
    ) -> MarketplaceResult<SubmitTask> {
        request.validate()?;
        self.require_user(user_id).await?;

        let mut submit_task = self
            .submit_task_repository
            .find_by_id(submit_task_id)
            .await?
            .ok_or(MarketplaceError::SubmitTaskNotFound)?;

        // 他人的报名记录按不存在处理
        if submit_task.user_id != user_id {
            warn!("用户 {} 尝试提交他人的报名记录 {}", user_id, submit_task.id);
            return Err(MarketplaceError::SubmitTaskNotFound);
        }

        if !submit_task.is_pending() {
            return Err(MarketplaceError::bad_request("Already submitted"));
        }

        submit_task.image = Some(request.image);
        submit_task.status = SubmitTaskStatus::Submitted;
        submit_task.updated_at = Utc::now();

        let updated = self.submit_task_repository.update(&submit_task).await?;
        info!("提交任务成功: {}", updated.entity_description());
        Ok(updated)
    }

    /// 当前用户自己的报名记录
    #[instrument(skip(self))]
    pub async fn get_employee_tasks(
        &self,
        user_id: Uuid,
        status: Option<SubmitTaskStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> MarketplaceResult<Page<SubmitTaskDetails>> {
        self.require_user(user_id).await?;
        let filter = SubmitTaskFilter {
            user_id: Some(user_id),
            status,
            ..Default::default()
        };
        self.find_page(&filter, PageRequest::new(page, limit)).await
    }

    /// 所有用户的报名记录（管理员）
    #[instrument(skip(self))]
    pub async fn get_submitted_tasks(
        &self,
        status: Option<SubmitTaskStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> MarketplaceResult<Page<SubmitTaskDetails>> {
        let filter = SubmitTaskFilter {
            status,
            ..Default::default()
        };
        self.find_page(&filter, PageRequest::new(page, limit)).await
    }

    #[instrument(skip(self, request))]
    pub async fn submit_task_update(
        &self,
        id: Uuid,
        request: SubmitTaskUpdateRequest,
    ) -> MarketplaceResult<SubmitTask> {
        request.validate()?;

        let mut submit_task = self
            .submit_task_repository
            .find_by_id(id)
            .await?
            .ok_or(MarketplaceError::SubmitTaskNotFound)?;

        if let Some(status) = request.status {
            submit_task.status = status;
        }
        if let Some(image) = request.image {
            submit_task.image = Some(image);
        }
        submit_task.updated_at = Utc::now();

        let updated = self.submit_task_repository.update(&submit_task).await?;
        info!(
            "更新提交记录: {}, 状态={}",
            updated.entity_description(),
            updated.status
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_register_single_task(
        &self,
        id: Uuid,
    ) -> MarketplaceResult<SubmitTaskDetails> {
        self.submit_task_repository
            .find_details_by_id(id)
            .await?
            .ok_or(MarketplaceError::SubmitTaskNotFound)
    }

    async fn find_page(
        &self,
        filter: &SubmitTaskFilter,
        request: PageRequest,
    ) -> MarketplaceResult<Page<SubmitTaskDetails>> {
        let total = self.submit_task_repository.count(filter).await?;
        let items = self
            .submit_task_repository
            .find_page(filter, &request)
            .await?;
        Ok(Page::new(items, total, request))
    }
}
