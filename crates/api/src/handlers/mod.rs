pub mod health;
pub mod payment;
pub mod submit_tasks;
pub mod tasks;
