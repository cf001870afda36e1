//! Blog service
//!
//! Implements business logic for blog posts:
//! - Create, read, update and soft delete posts
//! - Title uniqueness across every stored post
//! - Paginated listing of live posts

use crate::db::repositories::BlogRepository;
use crate::models::{Blog, BlogInput, FieldError, ListParams, PagedResult};
use std::sync::Arc;

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    /// Post is missing or soft deleted
    #[error("Blog post not found.")]
    NotFound,

    /// Another post already uses the title
    #[error("A blog post with this title already exists.")]
    DuplicateTitle,

    /// Input failed field validation
    #[error("Validation failed for {} field(s)", .0.len())]
    ValidationError(Vec<FieldError>),

    /// Database driver error
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(anyhow::Error),
}

impl BlogServiceError {
    /// Classify an error coming out of the repository layer
    fn from_repo(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(db_err) if is_unique_violation(&db_err) => Self::DuplicateTitle,
            Ok(db_err) => Self::DatabaseError(db_err),
            Err(other) => Self::InternalError(other),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Blog service for managing posts
pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
}

impl BlogService {
    /// Create a new blog service
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Create a new post
    ///
    /// # Errors
    /// - `ValidationError` if a field is out of bounds
    /// - `DuplicateTitle` if any stored post, including deleted ones, uses the title
    pub async fn create(&self, input: BlogInput) -> Result<Blog, BlogServiceError> {
        input.validate().map_err(BlogServiceError::ValidationError)?;

        if self
            .repo
            .title_taken(&input.title, None)
            .await
            .map_err(BlogServiceError::from_repo)?
        {
            return Err(BlogServiceError::DuplicateTitle);
        }

        let blog = Blog::new(input);
        let created = self
            .repo
            .create(&blog)
            .await
            .map_err(BlogServiceError::from_repo)?;

        tracing::info!(id = created.id, title = %created.title, "Blog post created");
        Ok(created)
    }

    /// List live posts, newest first
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Blog>, BlogServiceError> {
        let total = self
            .repo
            .count_live()
            .await
            .map_err(BlogServiceError::from_repo)?;
        let items = self
            .repo
            .list_live(params)
            .await
            .map_err(BlogServiceError::from_repo)?;

        Ok(PagedResult::new(items, total, params))
    }

    /// Get a live post by ID
    pub async fn get(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.repo
            .get_live_by_id(id)
            .await
            .map_err(BlogServiceError::from_repo)?
            .ok_or(BlogServiceError::NotFound)
    }

    /// Replace every editable field of a live post
    ///
    /// `is_deleted: Some(true)` in the input soft deletes the post as part of
    /// the update; the stored post is still returned.
    ///
    /// # Errors
    /// - `ValidationError` if a field is out of bounds
    /// - `NotFound` if the post is missing or soft deleted, including when it
    ///   is deleted concurrently before the write lands
    /// - `DuplicateTitle` if the new title belongs to another post
    pub async fn update(&self, id: i64, input: BlogInput) -> Result<Blog, BlogServiceError> {
        input.validate().map_err(BlogServiceError::ValidationError)?;

        let mut blog = self.get(id).await?;

        if input.title != blog.title
            && self
                .repo
                .title_taken(&input.title, Some(id))
                .await
                .map_err(BlogServiceError::from_repo)?
        {
            return Err(BlogServiceError::DuplicateTitle);
        }

        blog.apply(input);
        let updated = self
            .repo
            .update(&blog)
            .await
            .map_err(BlogServiceError::from_repo)?
            .ok_or(BlogServiceError::NotFound)?;

        tracing::info!(id = updated.id, deleted = updated.is_deleted, "Blog post updated");
        Ok(updated)
    }

    /// Soft delete a live post
    pub async fn delete(&self, id: i64) -> Result<(), BlogServiceError> {
        let deleted = self
            .repo
            .soft_delete(id)
            .await
            .map_err(BlogServiceError::from_repo)?;

        if !deleted {
            return Err(BlogServiceError::NotFound);
        }

        tracing::info!(id, "Blog post deleted");
        Ok(())
    }
}
