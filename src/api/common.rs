//! Common API utilities and shared types
//!
//! This module contains the pagination query, the post id path parameter
//! and the extractors whose rejections render as `ApiError`.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::api::middleware::ApiError;
use crate::models::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

// ============================================================================
// Pagination
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> i64 {
    DEFAULT_PAGE
}

/// Default page size
pub fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Pagination query parameters, range-checked by `ListParams::new`
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

// ============================================================================
// Path parameters
// ============================================================================

/// `{id}` path segment. Deserializing by name keeps the key in parse errors,
/// so a bad id is reported at `["path", "id"]`.
#[derive(Debug, Deserialize)]
pub struct BlogId {
    pub id: i64,
}

// ============================================================================
// Extractors
// ============================================================================

/// JSON body extractor rejecting with a 422 field error
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path extractor rejecting with a 422 field error
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Query extractor rejecting with a 422 field error
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
