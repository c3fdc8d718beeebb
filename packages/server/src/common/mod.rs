// Common types and utilities shared across the application

pub mod api;
pub mod entity_ids;
pub mod id;

pub use api::{ApiError, ApiResult};
pub use entity_ids::*;
pub use id::{Id, V4, V7};
