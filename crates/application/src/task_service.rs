use chrono::Local;
use marketplace_domain::entities::{
    AdminTaskView, Task, TaskDetails, TaskFilter, TaskStatus, TaskType,
};
use marketplace_domain::repositories::{
    ServiceRepository, SubmitTaskRepository, TaskRepository, UserRepository,
};
use marketplace_domain::value_objects::{
    local_midnight, HomeFeed, Page, PageRequest, QueryOptions, QueryOptionsOverride, SortSpec,
};
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{CreateTaskRequest, UpdateTaskRequest};

/// 任务管理服务：创建、查询、更新、删除任务以及首页任务流
pub struct TaskService {
    task_repository: Arc<dyn TaskRepository>,
    submit_task_repository: Arc<dyn SubmitTaskRepository>,
    user_repository: Arc<dyn UserRepository>,
    service_repository: Arc<dyn ServiceRepository>,
}

impl TaskService {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        submit_task_repository: Arc<dyn SubmitTaskRepository>,
        user_repository: Arc<dyn UserRepository>,
        service_repository: Arc<dyn ServiceRepository>,
    ) -> Self {
        Self {
            task_repository,
            submit_task_repository,
            user_repository,
            service_repository,
        }
    }

    /// 创建任务，任务类型复制自所属服务
    #[instrument(skip(self, request), fields(service_id = %request.service_id))]
    pub async fn create_task(
        &self,
        user_id: Uuid,
        request: CreateTaskRequest,
    ) -> MarketplaceResult<Task> {
        request.validate()?;

        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(MarketplaceError::UserNotFound)?;
        let service = self
            .service_repository
            .find_by_id(request.service_id)
            .await?
            .ok_or(MarketplaceError::ServiceNotFound)?;

        let mut task = Task::new(request.name, request.link, user_id, &service);
        task.timeline = request.timeline;
        task.quantity = request.quantity;
        task.price = request.price;
        task.image = request.image;

        let created = self.task_repository.create(&task).await?;
        info!("创建任务成功: {}", created.entity_description());
        Ok(created)
    }

    /// 通用分页查询
    #[instrument(skip(self, filter, options))]
    pub async fn query_tasks(
        &self,
        filter: TaskFilter,
        options: QueryOptionsOverride,
    ) -> MarketplaceResult<Page<TaskDetails>> {
        let options = QueryOptions::merge(&options)?;
        self.find_task_page(&filter, &options.sort, options.page)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: Uuid) -> MarketplaceResult<TaskDetails> {
        self.task_repository
            .find_details_by_id(id)
            .await?
            .ok_or(MarketplaceError::TaskNotFound)
    }

    /// 物理删除任务，已有的提交记录保留
    #[instrument(skip(self))]
    pub async fn delete_task_by_id(&self, id: Uuid) -> MarketplaceResult<Task> {
        let deleted = self
            .task_repository
            .delete(id)
            .await?
            .ok_or(MarketplaceError::TaskNotFound)?;
        info!("删除任务成功: {}", deleted.entity_description());
        Ok(deleted)
    }

    /// 读取-合并-保存；`image` 非空时替换任务图片
    #[instrument(skip(self, request, image))]
    pub async fn update_task_by_id(
        &self,
        id: Uuid,
        request: UpdateTaskRequest,
        image: Option<String>,
    ) -> MarketplaceResult<Task> {
        request.validate()?;

        let mut task = self
            .task_repository
            .find_by_id(id)
            .await?
            .ok_or(MarketplaceError::TaskNotFound)?;

        let image = image.filter(|i| !i.is_empty());
        if request.is_empty() && image.is_none() {
            return Err(MarketplaceError::bad_request("No updatable fields provided"));
        }

        if let Some(image) = image {
            task.image = Some(image);
        }
        if let Some(name) = request.name {
            task.name = name;
        }
        if let Some(link) = request.link {
            task.link = link;
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(timeline) = request.timeline {
            task.timeline = Some(timeline);
        }
        if let Some(quantity) = request.quantity {
            task.quantity = Some(quantity);
        }
        if let Some(price) = request.price {
            task.price = Some(price);
        }
        task.updated_at = chrono::Utc::now();

        let updated = self.task_repository.update(&task).await?;
        debug!("更新任务成功: {}", updated.entity_description());
        Ok(updated)
    }

    /// 管理员任务列表，只包含创建者和服务都存在的任务
    #[instrument(skip(self))]
    pub async fn get_admin_tasks(
        &self,
        admin_id: Uuid,
        task_type: Option<TaskType>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> MarketplaceResult<Page<AdminTaskView>> {
        let request = PageRequest::new(page, limit);
        let filter = TaskFilter {
            task_type,
            ..Default::default()
        };

        let total = self.task_repository.count_with_owner(&filter).await?;
        let items = self
            .task_repository
            .find_page_with_owner(&filter, &request)
            .await?;
        Ok(Page::new(items, total, request))
    }

    /// 首页任务流：排除用户已报名的任务，只返回仍有名额的待处理任务
    #[instrument(skip(self))]
    pub async fn task_home(
        &self,
        user_id: Uuid,
        feed: HomeFeed,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> MarketplaceResult<Page<TaskDetails>> {
        let registered = self.submit_task_repository.task_ids_for_user(user_id).await?;
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(MarketplaceError::UserNotFound)?;

        let mut filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            quantity_above: Some(0),
            exclude_ids: registered,
            ..Default::default()
        };
        let midnight = local_midnight(Local::now());
        match feed {
            HomeFeed::Today => filter.created_from = Some(midnight),
            HomeFeed::Others => filter.created_before = Some(midnight),
            HomeFeed::All => {}
        }

        self.find_task_page(
            &filter,
            &[SortSpec::newest_first()],
            PageRequest::new(page, limit),
        )
        .await
    }

    async fn find_task_page(
        &self,
        filter: &TaskFilter,
        sort: &[SortSpec],
        request: PageRequest,
    ) -> MarketplaceResult<Page<TaskDetails>> {
        let total = self.task_repository.count(filter).await?;
        let items = self
            .task_repository
            .find_page(filter, sort, &request)
            .await?;
        debug!(
            "任务分页查询: page={}, limit={}, total={}",
            request.page, request.limit, total
        );
        Ok(Page::new(items, total, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_domain::entities::{NidStatus, SubmitTask};
    use marketplace_domain::value_objects::SortField;
    use marketplace_testing_utils::{
        MockRepositories, ServiceBuilder, TaskBuilder, UserBuilder,
    };

    fn service(repos: &MockRepositories) -> TaskService {
        TaskService::new(
            repos.tasks.clone(),
            repos.submit_tasks.clone(),
            repos.users.clone(),
            repos.services.clone(),
        )
    }

    fn create_request(service_id: Uuid) -> CreateTaskRequest {
        CreateTaskRequest {
            name: "Like our page".to_string(),
            link: "https://facebook.com/page".to_string(),
            service_id,
            timeline: None,
            quantity: Some(5),
            price: Some(3.0),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_task_copies_service_type() {
        let repos = MockRepositories::new();
        let user = repos.store.insert_user(UserBuilder::new().build());
        let svc = repos
            .store
            .insert_service(ServiceBuilder::new().with_type(TaskType::Corporate).build());

        let task = service(&repos)
            .create_task(user.id, create_request(svc.id))
            .await
            .unwrap();

        assert_eq!(task.task_type, TaskType::Corporate);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.user_id, user.id);
        assert_eq!(task.quantity, Some(5));
        assert_eq!(repos.store.task_count(), 1);
    }

    #[tokio::test]
    async fn test_create_task_requires_user_and_service() {
        let repos = MockRepositories::new();
        let svc = repos.store.insert_service(ServiceBuilder::new().build());
        let err = service(&repos)
            .create_task(Uuid::new_v4(), create_request(svc.id))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::UserNotFound));

        let user = repos.store.insert_user(UserBuilder::new().build());
        let err = service(&repos)
            .create_task(user.id, create_request(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::ServiceNotFound));
        assert_eq!(err.to_string(), "Service not found");
    }

    #[tokio::test]
    async fn test_create_task_rejects_invalid_request() {
        let repos = MockRepositories::new();
        let user = repos.store.insert_user(UserBuilder::new().build());
        let svc = repos.store.insert_service(ServiceBuilder::new().build());
        let mut request = create_request(svc.id);
        request.link = "nope".to_string();

        let err = service(&repos)
            .create_task(user.id, request)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
        assert_eq!(repos.store.task_count(), 0);
    }

    #[tokio::test]
    async fn test_get_task_populates_user_and_service() {
        let repos = MockRepositories::new();
        let user = repos.store.insert_user(UserBuilder::new().with_name("Rahim").build());
        let svc = repos.store.insert_service(ServiceBuilder::new().build());
        let task = repos.store.insert_task(
            TaskBuilder::new().with_user(user.id).with_service(&svc).build(),
        );

        let details = service(&repos).get_task_by_id(task.id).await.unwrap();
        assert_eq!(details.user.unwrap().full_name, "Rahim");
        assert_eq!(details.service.unwrap().id, svc.id);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let repos = MockRepositories::new();
        let svc = service(&repos);

        let err = svc.delete_task_by_id(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.to_string(), "Task not found");

        let task = repos.store.insert_task(TaskBuilder::new().build());
        let deleted = svc.delete_task_by_id(task.id).await.unwrap();
        assert_eq!(deleted.id, task.id);
        let err = svc.get_task_by_id(task.id).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::TaskNotFound));
    }

    #[tokio::test]
    async fn test_delete_task_keeps_submissions() {
        let repos = MockRepositories::new();
        let task = repos.store.insert_task(TaskBuilder::new().build());
        repos
            .store
            .insert_submit_task(SubmitTask::new(Uuid::new_v4(), task.id));

        service(&repos).delete_task_by_id(task.id).await.unwrap();
        assert_eq!(repos.store.submit_task_count(), 1);
    }

    #[tokio::test]
    async fn test_update_task_merges_whitelisted_fields() {
        let repos = MockRepositories::new();
        let owner = Uuid::new_v4();
        let task = repos.store.insert_task(
            TaskBuilder::new()
                .with_user(owner)
                .with_task_type(TaskType::Video)
                .build(),
        );

        let request = UpdateTaskRequest {
            name: Some("renamed".to_string()),
            status: Some(TaskStatus::Completed),
            quantity: Some(0),
            ..Default::default()
        };
        let updated = service(&repos)
            .update_task_by_id(task.id, request, Some("https://cdn/img.png".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.quantity, Some(0));
        assert_eq!(updated.image.as_deref(), Some("https://cdn/img.png"));
        assert_eq!(updated.user_id, owner);
        assert_eq!(updated.task_type, TaskType::Video);
        assert_eq!(updated.link, task.link);
    }

    #[tokio::test]
    async fn test_update_without_changes_is_rejected() {
        let repos = MockRepositories::new();
        let task = repos.store.insert_task(TaskBuilder::new().build());

        let err = service(&repos)
            .update_task_by_id(task.id, UpdateTaskRequest::default(), Some(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::BadRequest(ref m) if m == "No updatable fields provided"));
        assert_eq!(repos.store.task(task.id).unwrap().name, task.name);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let repos = MockRepositories::new();
        let err = service(&repos)
            .update_task_by_id(Uuid::new_v4(), UpdateTaskRequest::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::TaskNotFound));
    }

    #[tokio::test]
    async fn test_query_tasks_paginates_and_sorts() {
        let repos = MockRepositories::new();
        for (i, price) in [5.0, 1.0, 3.0].iter().enumerate() {
            repos.store.insert_task(
                TaskBuilder::new()
                    .with_name(&format!("task-{i}"))
                    .with_price(Some(*price))
                    .build(),
            );
        }

        let page = service(&repos)
            .query_tasks(
                TaskFilter::default(),
                QueryOptionsOverride {
                    sort_by: Some("price:asc".to_string()),
                    page: Some(1),
                    limit: Some(2),
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total_results, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].task.price, Some(1.0));
        assert_eq!(page.items[1].task.price, Some(3.0));
    }

    #[tokio::test]
    async fn test_query_tasks_rejects_unknown_sort_field() {
        let repos = MockRepositories::new();
        let err = service(&repos)
            .query_tasks(
                TaskFilter::default(),
                QueryOptionsOverride {
                    sort_by: Some("secret:asc".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
        assert_eq!(SortField::Name.column(), "name");
    }

    #[tokio::test]
    async fn test_admin_tasks_filter_by_type_and_skip_orphans() {
        let repos = MockRepositories::new();
        let user = repos.store.insert_user(UserBuilder::new().build());
        let video = repos.store.insert_service(ServiceBuilder::new().build());
        let corporate = repos
            .store
            .insert_service(ServiceBuilder::new().with_type(TaskType::Corporate).build());

        repos
            .store
            .insert_task(TaskBuilder::new().with_user(user.id).with_service(&video).build());
        repos.store.insert_task(
            TaskBuilder::new()
                .with_user(user.id)
                .with_service(&corporate)
                .build(),
        );
        // 创建者已不存在
        repos.store.insert_task(
            TaskBuilder::new()
                .with_user(Uuid::new_v4())
                .with_service(&video)
                .build(),
        );

        let page = service(&repos)
            .get_admin_tasks(Uuid::new_v4(), Some(TaskType::Video), None, None)
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].user.id, user.id);
        assert_eq!(page.items[0].service.id, video.id);
    }

    #[tokio::test]
    async fn test_task_home_excludes_registered_and_unavailable() {
        let repos = MockRepositories::new();
        let user = repos.store.insert_user(UserBuilder::new().build());

        let open = repos.store.insert_task(TaskBuilder::new().build());
        let registered = repos.store.insert_task(TaskBuilder::new().build());
        repos.store.insert_task(TaskBuilder::new().with_quantity(Some(0)).build());
        repos.store.insert_task(TaskBuilder::new().with_quantity(None).build());
        repos
            .store
            .insert_task(TaskBuilder::new().with_status(TaskStatus::Completed).build());
        repos
            .store
            .insert_submit_task(SubmitTask::new(user.id, registered.id));

        let page = service(&repos)
            .task_home(user.id, HomeFeed::All, None, None)
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.items[0].task.id, open.id);
    }

    #[tokio::test]
    async fn test_task_home_today_and_others() {
        let repos = MockRepositories::new();
        let user = repos
            .store
            .insert_user(UserBuilder::new().with_nid_status(NidStatus::Pending).build());
        let fresh = repos.store.insert_task(TaskBuilder::new().build());
        let old = repos
            .store
            .insert_task(TaskBuilder::new().created_days_ago(3).build());
        let svc = service(&repos);

        let today = svc.task_home(user.id, HomeFeed::Today, None, None).await.unwrap();
        assert_eq!(today.items.len(), 1);
        assert_eq!(today.items[0].task.id, fresh.id);

        let others = svc.task_home(user.id, HomeFeed::Others, None, None).await.unwrap();
        assert_eq!(others.items.len(), 1);
        assert_eq!(others.items[0].task.id, old.id);

        let all = svc.task_home(user.id, HomeFeed::All, None, None).await.unwrap();
        assert_eq!(all.items[0].task.id, fresh.id);
        assert_eq!(all.total_results, 2);
    }

    #[tokio::test]
    async fn test_task_home_requires_user() {
        let repos = MockRepositories::new();
        let err = service(&repos)
            .task_home(Uuid::new_v4(), HomeFeed::All, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }
}
