//! # Marketplace Testing Utils
//!
//! Shared testing utilities for the task marketplace workspace.
//!
//! - **Mock Repositories**: in-memory implementations of every repository trait,
//!   sharing one [`MockStore`] so populated views (task + user + service) work
//! - **Test Data Builders**: entities with sensible defaults
//!
//! ```rust
//! use marketplace_testing_utils::{MockRepositories, UserBuilder};
//!
//! let repos = MockRepositories::new();
//! let user = repos.store.insert_user(UserBuilder::new().build());
//! assert!(repos.store.user(user.id).is_some());
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
