//! Blog post model
//!
//! This module provides:
//! - `Blog` entity representing a stored blog post
//! - `BlogPayload` wire body, checked field by field into a `BlogInput`
//! - `BlogInput` request payload for creating and updating posts
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{check_length, check_range, FieldError};

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 255;
pub const EXCERPT_MIN_CHARS: usize = 20;
pub const EXCERPT_MAX_CHARS: usize = 300;
pub const IMAGE_URL_MAX_CHARS: usize = 255;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 25;

/// Blog post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    /// Unique identifier
    pub id: i64,
    /// Title, unique across all posts including deleted ones
    pub title: String,
    /// Short summary shown in listings
    pub excerpt: String,
    /// Full body
    pub content: String,
    /// Cover image URL
    pub image_url: String,
    /// Soft delete flag
    pub is_deleted: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Build an unsaved post from validated input
    pub fn new(input: BlogInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            image_url: input.image_url,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields with the given input.
    ///
    /// An explicit `is_deleted` flag is copied too, so an update can soft
    /// delete the post.
    pub fn apply(&mut self, input: BlogInput) {
        self.title = input.title;
        self.excerpt = input.excerpt;
        self.content = input.content;
        self.image_url = input.image_url;
        if let Some(is_deleted) = input.is_deleted {
            self.is_deleted = is_deleted;
        }
    }
}

/// Request body as received. Absent fields are kept as `None` so every
/// problem can be reported at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPayload {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_deleted: Option<bool>,
}

impl BlogPayload {
    /// Check every field in order, collecting missing fields and length
    /// violations together
    pub fn into_input(self) -> Result<BlogInput, Vec<FieldError>> {
        let BlogPayload {
            title,
            excerpt,
            content,
            image_url,
            is_deleted,
        } = self;

        let mut errors = Vec::new();
        let title = require(
            &mut errors,
            "title",
            title,
            Some(TITLE_MIN_CHARS),
            Some(TITLE_MAX_CHARS),
        );
        let excerpt = require(
            &mut errors,
            "excerpt",
            excerpt,
            Some(EXCERPT_MIN_CHARS),
            Some(EXCERPT_MAX_CHARS),
        );
        let content = require(&mut errors, "content", content, None, None);
        let image_url = require(
            &mut errors,
            "image_url",
            image_url,
            None,
            Some(IMAGE_URL_MAX_CHARS),
        );

        match (title, excerpt, content, image_url) {
            (Some(title), Some(excerpt), Some(content), Some(image_url)) if errors.is_empty() => {
                Ok(BlogInput {
                    title,
                    excerpt,
                    content,
                    image_url,
                    is_deleted,
                })
            }
            _ => Err(errors),
        }
    }
}

fn require(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<String>,
    min: Option<usize>,
    max: Option<usize>,
) -> Option<String> {
    match value {
        Some(value) => {
            check_length(errors, &["body", field], &value, min, max);
            Some(value)
        }
        None => {
            errors.push(FieldError::new("missing", &["body", field], "Field required"));
            None
        }
    }
}

/// Payload for creating or updating a blog post
///
/// Every editable field is required on both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogInput {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: String,
    /// Ignored on create. On update, `Some(true)` soft deletes the post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl BlogInput {
    pub fn new(
        title: impl Into<String>,
        excerpt: impl Into<String>,
        content: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            excerpt: excerpt.into(),
            content: content.into(),
            image_url: image_url.into(),
            is_deleted: None,
        }
    }

    /// Validate field lengths, reporting every failing field
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_length(
            &mut errors,
            &["body", "title"],
            &self.title,
            Some(TITLE_MIN_CHARS),
            Some(TITLE_MAX_CHARS),
        );
        check_length(
            &mut errors,
            &["body", "excerpt"],
            &self.excerpt,
            Some(EXCERPT_MIN_CHARS),
            Some(EXCERPT_MAX_CHARS),
        );
        check_length(
            &mut errors,
            &["body", "image_url"],
            &self.image_url,
            None,
            Some(IMAGE_URL_MAX_CHARS),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: i64,
    /// Number of items per page
    pub page_size: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    /// Create pagination parameters, rejecting out-of-range values
    pub fn new(page: i64, page_size: i64) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        check_range(&mut errors, &["query", "page"], page, 1, None);
        check_range(
            &mut errors,
            &["query", "page_size"],
            page_size,
            1,
            Some(MAX_PAGE_SIZE),
        );

        if errors.is_empty() {
            Ok(Self { page, page_size })
        } else {
            Err(errors)
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: i64,
    /// Number of items per page
    pub page_size: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
        }
    }

    /// Whether items exist beyond this page
    pub fn has_next(&self) -> bool {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .saturating_add(self.page_size)
            < self.total
    }

    /// Whether a page precedes this one
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
