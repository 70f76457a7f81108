//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则。应用层只依赖这些 trait，
//! 存储技术（SQLite、内存实现等）由基础设施层提供。
//!
//! 分页查询由两次独立调用组成（`count_*` 与 `find_*_page`），两者使用同一过滤器，
//! 但不在同一事务内执行。

use async_trait::async_trait;
use marketplace_errors::MarketplaceResult;
use uuid::Uuid;

use crate::entities::{
    AdminTaskView, Payment, Service, SubmitTask, SubmitTaskDetails, SubmitTaskFilter, Task,
    TaskDetails, TaskFilter, User,
};
use crate::value_objects::{PageRequest, SortSpec};

/// 任务仓储抽象
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> MarketplaceResult<Task>;
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Task>>;
    /// 按ID查询并展开创建者与服务
    async fn find_details_by_id(&self, id: Uuid) -> MarketplaceResult<Option<TaskDetails>>;
    async fn update(&self, task: &Task) -> MarketplaceResult<Task>;
    /// 物理删除，返回被删除的任务；不级联删除提交记录
    async fn delete(&self, id: Uuid) -> MarketplaceResult<Option<Task>>;
    async fn count(&self, filter: &TaskFilter) -> MarketplaceResult<i64>;
    async fn find_page(
        &self,
        filter: &TaskFilter,
        sort: &[SortSpec],
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<TaskDetails>>;
    /// 只统计用户与服务都存在的任务
    async fn count_with_owner(&self, filter: &TaskFilter) -> MarketplaceResult<i64>;
    /// 与用户、服务内连接的分页查询
    async fn find_page_with_owner(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<AdminTaskView>>;
}

/// 任务提交记录仓储抽象
#[async_trait]
pub trait SubmitTaskRepository: Send + Sync {
    async fn create(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask>;
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<SubmitTask>>;
    async fn find_details_by_id(&self, id: Uuid)
        -> MarketplaceResult<Option<SubmitTaskDetails>>;
    async fn update(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask>;
    /// 用户已报名过的任务ID
    async fn task_ids_for_user(&self, user_id: Uuid) -> MarketplaceResult<Vec<Uuid>>;
    async fn count(&self, filter: &SubmitTaskFilter) -> MarketplaceResult<i64>;
    /// 按创建时间倒序分页
    async fn find_page(
        &self,
        filter: &SubmitTaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<SubmitTaskDetails>>;
}

/// 用户由外部系统维护，这里只读
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<User>>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Service>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Payment>>;
}
