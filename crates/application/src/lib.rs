//! 应用服务层
//!
//! 服务只依赖领域层的仓储 trait，通过 `Arc<dyn ...>` 注入具体实现。

pub mod dto;
pub mod payment_service;
pub mod task_lifecycle_service;
pub mod task_service;

pub use dto::*;
pub use payment_service::PaymentService;
pub use task_lifecycle_service::TaskLifecycleService;
pub use task_service::TaskService;
