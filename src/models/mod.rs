//! Data models
//!
//! This module contains the data structures used throughout the blog API:
//! - The `Blog` entity and its request payloads
//! - Pagination types
//! - Field validation errors

mod blog;
mod validation;

pub use blog::{
    Blog, BlogInput, BlogPayload, ListParams, PagedResult, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
    EXCERPT_MAX_CHARS, EXCERPT_MIN_CHARS, IMAGE_URL_MAX_CHARS, MAX_PAGE_SIZE, TITLE_MAX_CHARS,
    TITLE_MIN_CHARS,
};
pub use validation::{check_length, check_range, FieldError};
