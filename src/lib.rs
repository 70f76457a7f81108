//! 任务市场后端服务
//!
//! 二进制入口见 `main.rs`；这里导出应用装配，便于集成测试直接驱动。

pub mod app;

pub use app::Application;
