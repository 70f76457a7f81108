pub mod sqlite_payment_repository;
pub mod sqlite_service_repository;
pub mod sqlite_submit_task_repository;
pub mod sqlite_task_repository;
pub mod sqlite_user_repository;

pub use sqlite_payment_repository::SqlitePaymentRepository;
pub use sqlite_service_repository::SqliteServiceRepository;
pub use sqlite_submit_task_repository::SqliteSubmitTaskRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_user_repository::SqliteUserRepository;
