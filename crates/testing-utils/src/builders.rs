//! Test data builders for creating test entities
//!
//! Builders start from sensible defaults (an approved regular user, a video
//! service, a pending task with capacity) and expose `with_*` setters.

use chrono::{DateTime, Duration, Utc};
use marketplace_domain::entities::{
    NidStatus, Payment, Service, SubmitTask, SubmitTaskStatus, Task, TaskStatus, TaskType,
    Timeline, User, UserRole,
};
use uuid::Uuid;

/// Builder for creating test Task entities
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            task: Task {
                id: Uuid::new_v4(),
                name: "test_task".to_string(),
                link: "https://example.com/post/1".to_string(),
                user_id: Uuid::new_v4(),
                task_type: TaskType::Video,
                service_id: Uuid::new_v4(),
                payment_id: None,
                status: TaskStatus::Pending,
                timeline: None,
                quantity: Some(5),
                price: Some(10.0),
                image: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.task.user_id = user_id;
        self
    }

    /// 绑定服务，同时复制服务类型
    pub fn with_service(mut self, service: &Service) -> Self {
        self.task.service_id = service.id;
        self.task.task_type = service.service_type;
        self
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task.task_type = task_type;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn with_quantity(mut self, quantity: Option<i64>) -> Self {
        self.task.quantity = quantity;
        self
    }

    pub fn with_price(mut self, price: Option<f64>) -> Self {
        self.task.price = price;
        self
    }

    pub fn with_timeline(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.task.timeline = Some(Timeline {
            start: Some(start),
            end: Some(end),
        });
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.task.created_at = created_at;
        self.task.updated_at = created_at;
        self
    }

    pub fn created_days_ago(self, days: i64) -> Self {
        self.with_created_at(Utc::now() - Duration::days(days))
    }

    pub fn build(self) -> Task {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test SubmitTask entities
pub struct SubmitTaskBuilder {
    submit_task: SubmitTask,
}

impl SubmitTaskBuilder {
    pub fn new() -> Self {
        Self {
            submit_task: SubmitTask::new(Uuid::new_v4(), Uuid::new_v4()),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.submit_task.user_id = user_id;
        self
    }

    pub fn with_task(mut self, task_id: Uuid) -> Self {
        self.submit_task.task_id = task_id;
        self
    }

    pub fn with_status(mut self, status: SubmitTaskStatus) -> Self {
        self.submit_task.status = status;
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.submit_task.image = Some(image.to_string());
        self
    }

    pub fn created_minutes_ago(mut self, minutes: i64) -> Self {
        let created_at = Utc::now() - Duration::minutes(minutes);
        self.submit_task.created_at = created_at;
        self.submit_task.updated_at = created_at;
        self
    }

    pub fn build(self) -> SubmitTask {
        self.submit_task
    }
}

impl Default for SubmitTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test User entities
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self {
            user: User {
                id: Uuid::new_v4(),
                full_name: "Test User".to_string(),
                email: "user@example.com".to_string(),
                image: Some("https://example.com/avatar.png".to_string()),
                role: UserRole::User,
                nid_status: NidStatus::Approved,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.user.id = id;
        self
    }

    pub fn with_name(mut self, full_name: &str) -> Self {
        self.user.full_name = full_name.to_string();
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.user.role = role;
        self
    }

    pub fn with_nid_status(mut self, nid_status: NidStatus) -> Self {
        self.user.nid_status = nid_status;
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Service entities
pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            service: Service {
                id: Uuid::new_v4(),
                name: "YouTube views".to_string(),
                service_type: TaskType::Video,
                price: Some(2.5),
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_type(mut self, service_type: TaskType) -> Self {
        self.service.service_type = service_type;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.service.name = name.to_string();
        self
    }

    pub fn build(self) -> Service {
        self.service
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Payment entities
pub struct PaymentBuilder {
    payment: Payment,
}

impl PaymentBuilder {
    pub fn new() -> Self {
        Self {
            payment: Payment {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                amount: 50.0,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.payment.user_id = user_id;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.payment.amount = amount;
        self
    }

    pub fn build(self) -> Payment {
        self.payment
    }
}

impl Default for PaymentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
