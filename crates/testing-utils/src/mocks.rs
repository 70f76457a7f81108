//! In-memory implementations of all repository traits
//!
//! All mock repositories created by [`MockRepositories::new`] share one
//! [`MockStore`], so joins such as task + creator + service behave like the
//! SQLite adapter without a database connection.

use async_trait::async_trait;
use marketplace_domain::entities::{
    AdminTaskView, Payment, Service, SubmitTask, SubmitTaskDetails, SubmitTaskFilter, Task,
    TaskDetails, TaskFilter, User,
};
use marketplace_domain::repositories::{
    PaymentRepository, ServiceRepository, SubmitTaskRepository, TaskRepository, UserRepository,
};
use marketplace_domain::value_objects::{PageRequest, SortDirection, SortField, SortSpec};
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreData {
    tasks: HashMap<Uuid, Task>,
    submit_tasks: HashMap<Uuid, SubmitTask>,
    users: HashMap<Uuid, User>,
    services: HashMap<Uuid, Service>,
    payments: HashMap<Uuid, Payment>,
}

/// Shared in-memory backing store
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<StoreData>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) -> User {
        self.data.lock().unwrap().users.insert(user.id, user.clone());
        user
    }

    pub fn insert_service(&self, service: Service) -> Service {
        self.data
            .lock()
            .unwrap()
            .services
            .insert(service.id, service.clone());
        service
    }

    pub fn insert_payment(&self, payment: Payment) -> Payment {
        self.data
            .lock()
            .unwrap()
            .payments
            .insert(payment.id, payment.clone());
        payment
    }

    pub fn insert_task(&self, task: Task) -> Task {
        self.data.lock().unwrap().tasks.insert(task.id, task.clone());
        task
    }

    pub fn insert_submit_task(&self, submit_task: SubmitTask) -> SubmitTask {
        self.data
            .lock()
            .unwrap()
            .submit_tasks
            .insert(submit_task.id, submit_task.clone());
        submit_task
    }

    pub fn remove_user(&self, id: Uuid) {
        self.data.lock().unwrap().users.remove(&id);
    }

    pub fn remove_service(&self, id: Uuid) {
        self.data.lock().unwrap().services.remove(&id);
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.data.lock().unwrap().users.get(&id).cloned()
    }

    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.data.lock().unwrap().tasks.get(&id).cloned()
    }

    pub fn submit_task(&self, id: Uuid) -> Option<SubmitTask> {
        self.data.lock().unwrap().submit_tasks.get(&id).cloned()
    }

    pub fn task_count(&self) -> usize {
        self.data.lock().unwrap().tasks.len()
    }

    pub fn submit_task_count(&self) -> usize {
        self.data.lock().unwrap().submit_tasks.len()
    }

    pub fn clear(&self) {
        *self.data.lock().unwrap() = StoreData::default();
    }
}

impl StoreData {
    fn task_details(&self, task: &Task) -> TaskDetails {
        TaskDetails {
            task: task.clone(),
            user: self.users.get(&task.user_id).map(User::summary),
            service: self.services.get(&task.service_id).cloned(),
        }
    }

    fn admin_view(&self, task: &Task) -> Option<AdminTaskView> {
        let user = self.users.get(&task.user_id)?;
        let service = self.services.get(&task.service_id)?;
        Some(AdminTaskView {
            task: task.clone(),
            user: user.clone(),
            service: service.clone(),
        })
    }

    fn submit_task_details(&self, submit_task: &SubmitTask) -> SubmitTaskDetails {
        SubmitTaskDetails {
            submit_task: submit_task.clone(),
            user: self.users.get(&submit_task.user_id).cloned(),
            task: self.tasks.get(&submit_task.task_id).cloned(),
        }
    }

    fn filtered_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.values().filter(|t| filter.matches(t)).collect()
    }

    fn filtered_submit_tasks(&self, filter: &SubmitTaskFilter) -> Vec<&SubmitTask> {
        let mut items: Vec<&SubmitTask> = self
            .submit_tasks
            .values()
            .filter(|s| filter.matches(s))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

fn compare_field(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a
            .price
            .partial_cmp(&b.price)
            .unwrap_or(Ordering::Equal),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

fn sort_tasks(tasks: &mut [&Task], sort: &[SortSpec]) {
    let default_sort = [SortSpec::newest_first()];
    let sort = if sort.is_empty() { &default_sort[..] } else { sort };
    tasks.sort_by(|a, b| {
        sort.iter()
            .map(|spec| {
                let ordering = compare_field(a, b, spec.field);
                match spec.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn paginate<T>(items: impl Iterator<Item = T>, page: &PageRequest) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

/// Mock implementation of TaskRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockTaskRepository {
    store: MockStore,
}

impl MockTaskRepository {
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn create(&self, task: &Task) -> MarketplaceResult<Task> {
        Ok(self.store.insert_task(task.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Task>> {
        Ok(self.store.task(id))
    }

    async fn find_details_by_id(&self, id: Uuid) -> MarketplaceResult<Option<TaskDetails>> {
        let data = self.store.data.lock().unwrap();
        Ok(data.tasks.get(&id).map(|t| data.task_details(t)))
    }

    async fn update(&self, task: &Task) -> MarketplaceResult<Task> {
        let mut data = self.store.data.lock().unwrap();
        match data.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(task.clone())
            }
            None => Err(MarketplaceError::TaskNotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> MarketplaceResult<Option<Task>> {
        Ok(self.store.data.lock().unwrap().tasks.remove(&id))
    }

    async fn count(&self, filter: &TaskFilter) -> MarketplaceResult<i64> {
        let data = self.store.data.lock().unwrap();
        Ok(data.filtered_tasks(filter).len() as i64)
    }

    async fn find_page(
        &self,
        filter: &TaskFilter,
        sort: &[SortSpec],
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<TaskDetails>> {
        let data = self.store.data.lock().unwrap();
        let mut tasks = data.filtered_tasks(filter);
        sort_tasks(&mut tasks, sort);
        Ok(paginate(tasks.into_iter().map(|t| data.task_details(t)), page))
    }

    async fn count_with_owner(&self, filter: &TaskFilter) -> MarketplaceResult<i64> {
        let data = self.store.data.lock().unwrap();
        Ok(data
            .filtered_tasks(filter)
            .into_iter()
            .filter_map(|t| data.admin_view(t))
            .count() as i64)
    }

    async fn find_page_with_owner(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<AdminTaskView>> {
        let data = self.store.data.lock().unwrap();
        let mut tasks = data.filtered_tasks(filter);
        sort_tasks(&mut tasks, &[]);
        Ok(paginate(
            tasks.into_iter().filter_map(|t| data.admin_view(t)),
            page,
        ))
    }
}

/// Mock implementation of SubmitTaskRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockSubmitTaskRepository {
    store: MockStore,
}

impl MockSubmitTaskRepository {
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubmitTaskRepository for MockSubmitTaskRepository {
    async fn create(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask> {
        Ok(self.store.insert_submit_task(submit_task.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<SubmitTask>> {
        Ok(self.store.submit_task(id))
    }

    async fn find_details_by_id(
        &self,
        id: Uuid,
    ) -> MarketplaceResult<Option<SubmitTaskDetails>> {
        let data = self.store.data.lock().unwrap();
        Ok(data
            .submit_tasks
            .get(&id)
            .map(|s| data.submit_task_details(s)))
    }

    async fn update(&self, submit_task: &SubmitTask) -> MarketplaceResult<SubmitTask> {
        let mut data = self.store.data.lock().unwrap();
        match data.submit_tasks.get_mut(&submit_task.id) {
            Some(existing) => {
                *existing = submit_task.clone();
                Ok(submit_task.clone())
            }
            None => Err(MarketplaceError::SubmitTaskNotFound),
        }
    }

    async fn task_ids_for_user(&self, user_id: Uuid) -> MarketplaceResult<Vec<Uuid>> {
        let data = self.store.data.lock().unwrap();
        Ok(data
            .submit_tasks
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.task_id)
            .collect())
    }

    async fn count(&self, filter: &SubmitTaskFilter) -> MarketplaceResult<i64> {
        let data = self.store.data.lock().unwrap();
        Ok(data.filtered_submit_tasks(filter).len() as i64)
    }

    async fn find_page(
        &self,
        filter: &SubmitTaskFilter,
        page: &PageRequest,
    ) -> MarketplaceResult<Vec<SubmitTaskDetails>> {
        let data = self.store.data.lock().unwrap();
        let items = data.filtered_submit_tasks(filter);
        Ok(paginate(
            items.into_iter().map(|s| data.submit_task_details(s)),
            page,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    store: MockStore,
}

impl MockUserRepository {
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<User>> {
        Ok(self.store.user(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockServiceRepository {
    store: MockStore,
}

impl MockServiceRepository {
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ServiceRepository for MockServiceRepository {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Service>> {
        Ok(self.store.data.lock().unwrap().services.get(&id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPaymentRepository {
    store: MockStore,
}

impl MockPaymentRepository {
    pub fn new(store: MockStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PaymentRepository for MockPaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> MarketplaceResult<Option<Payment>> {
        Ok(self.store.data.lock().unwrap().payments.get(&id).cloned())
    }
}

/// All mock repositories wired to the same store
#[derive(Debug, Clone)]
pub struct MockRepositories {
    pub store: MockStore,
    pub tasks: Arc<MockTaskRepository>,
    pub submit_tasks: Arc<MockSubmitTaskRepository>,
    pub users: Arc<MockUserRepository>,
    pub services: Arc<MockServiceRepository>,
    pub payments: Arc<MockPaymentRepository>,
}

impl MockRepositories {
    pub fn new() -> Self {
        let store = MockStore::new();
        Self {
            tasks: Arc::new(MockTaskRepository::new(store.clone())),
            submit_tasks: Arc::new(MockSubmitTaskRepository::new(store.clone())),
            users: Arc::new(MockUserRepository::new(store.clone())),
            services: Arc::new(MockServiceRepository::new(store.clone())),
            payments: Arc::new(MockPaymentRepository::new(store.clone())),
            store,
        }
    }
}

impl Default for MockRepositories {
    fn default() -> Self {
        Self::new()
    }
}
