//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating repository calls
//! - Handling validation and error cases

pub mod blog;

pub use blog::{BlogService, BlogServiceError};
