pub mod entities;
pub mod repositories;
pub mod task_query_builder;
pub mod value_objects;

pub use entities::*;
pub use marketplace_errors::{MarketplaceError, MarketplaceResult};
pub use repositories::*;
pub use value_objects::*;
