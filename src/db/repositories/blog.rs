//! Blog repository
//!
//! Database operations for blog posts.
//!
//! This module provides:
//! - `BlogRepository` trait defining the interface for blog data access
//! - `SqlxBlogRepository` implementing the trait for SQLite, MySQL and PostgreSQL
//!
//! Deletion is soft: rows are flagged with `is_deleted` and every read except
//! the title uniqueness check ignores flagged rows.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, postgres, sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Blog, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Insert a post and return it as stored
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    /// Get a post by ID, ignoring soft deleted posts
    async fn get_live_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// Check whether any post, deleted or not, already uses `title`
    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// List one page of live posts, newest first
    async fn list_live(&self, params: &ListParams) -> Result<Vec<Blog>>;

    /// Count live posts
    async fn count_live(&self) -> Result<i64>;

    /// Write the editable fields and deletion flag of a live post and return
    /// it as stored; `None` if no live post matched
    async fn update(&self, blog: &Blog) -> Result<Option<Blog>>;

    /// Flag a live post as deleted; returns false if no live post matched
    async fn soft_delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(sqlite(pool)?, blog).await,
            DatabaseDriver::Mysql => create_mysql(mysql(pool)?, blog).await,
            DatabaseDriver::Postgres => create_postgres(postgres(pool)?, blog).await,
        }
    }

    async fn get_live_by_id(&self, id: i64) -> Result<Option<Blog>> {
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => get_live_by_id_sqlite(sqlite(pool)?, id).await,
            DatabaseDriver::Mysql => get_live_by_id_mysql(mysql(pool)?, id).await,
            DatabaseDriver::Postgres => get_live_by_id_postgres(postgres(pool)?, id).await,
        }
    }

    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool> {
        // Ids start at 1, so 0 excludes nothing.
        let exclude_id = exclude_id.unwrap_or(0);
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => title_taken_sqlite(sqlite(pool)?, title, exclude_id).await,
            DatabaseDriver::Mysql => title_taken_mysql(mysql(pool)?, title, exclude_id).await,
            DatabaseDriver::Postgres => {
                title_taken_postgres(postgres(pool)?, title, exclude_id).await
            }
        }
    }

    async fn list_live(&self, params: &ListParams) -> Result<Vec<Blog>> {
        let (offset, limit) = (params.offset(), params.limit());
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => list_live_sqlite(sqlite(pool)?, offset, limit).await,
            DatabaseDriver::Mysql => list_live_mysql(mysql(pool)?, offset, limit).await,
            DatabaseDriver::Postgres => list_live_postgres(postgres(pool)?, offset, limit).await,
        }
    }

    async fn count_live(&self) -> Result<i64> {
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => count_live_sqlite(sqlite(pool)?).await,
            DatabaseDriver::Mysql => count_live_mysql(mysql(pool)?).await,
            DatabaseDriver::Postgres => count_live_postgres(postgres(pool)?).await,
        }
    }

    async fn update(&self, blog: &Blog) -> Result<Option<Blog>> {
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(sqlite(pool)?, blog).await,
            DatabaseDriver::Mysql => update_mysql(mysql(pool)?, blog).await,
            DatabaseDriver::Postgres => update_postgres(postgres(pool)?, blog).await,
        }
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let pool = self.pool.as_ref();
        match pool.driver() {
            DatabaseDriver::Sqlite => soft_delete_sqlite(sqlite(pool)?, id).await,
            DatabaseDriver::Mysql => soft_delete_mysql(mysql(pool)?, id).await,
            DatabaseDriver::Postgres => soft_delete_postgres(postgres(pool)?, id).await,
        }
    }
}

const COLUMNS: &str =
    "id, title, excerpt, content, image_url, is_deleted, created_at, updated_at";

// SQLite and MySQL share `?` placeholders

fn select_by_id_sql() -> String {
    format!("SELECT {COLUMNS} FROM blogs WHERE id = ?")
}

fn select_live_by_id_sql() -> String {
    format!("SELECT {COLUMNS} FROM blogs WHERE id = ? AND is_deleted = ?")
}

fn list_live_sql() -> String {
    format!(
        "SELECT {COLUMNS} FROM blogs WHERE is_deleted = ? \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    )
}

const INSERT_SQL: &str = "INSERT INTO blogs (title, excerpt, content, image_url, is_deleted, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?)";
const TITLE_TAKEN_SQL: &str = "SELECT COUNT(*) AS count FROM blogs WHERE title = ? AND id <> ?";
const COUNT_LIVE_SQL: &str = "SELECT COUNT(*) AS count FROM blogs WHERE is_deleted = ?";
const UPDATE_SQL: &str = "UPDATE blogs SET title = ?, excerpt = ?, content = ?, image_url = ?, \
     is_deleted = ?, updated_at = ? WHERE id = ? AND is_deleted = ?";
const SOFT_DELETE_SQL: &str =
    "UPDATE blogs SET is_deleted = ?, updated_at = ? WHERE id = ? AND is_deleted = ?";

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<Blog> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_SQL)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.image_url)
        .bind(false)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create blog post")?;

    let id = result.last_insert_rowid();
    let row = sqlx::query(&select_by_id_sql())
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to reload created blog post")?;
    row_to_blog_sqlite(&row)
}

async fn get_live_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query(&select_live_by_id_sql())
        .bind(id)
        .bind(false)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post")?;
    row.as_ref().map(row_to_blog_sqlite).transpose()
}

async fn title_taken_sqlite(pool: &SqlitePool, title: &str, exclude_id: i64) -> Result<bool> {
    let row = sqlx::query(TITLE_TAKEN_SQL)
        .bind(title)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check blog title")?;
    Ok(row.try_get::<i64, _>("count")? > 0)
}

async fn list_live_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Blog>> {
    let rows = sqlx::query(&list_live_sql())
        .bind(false)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list blog posts")?;
    rows.iter().map(row_to_blog_sqlite).collect()
}

async fn count_live_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query(COUNT_LIVE_SQL)
        .bind(false)
        .fetch_one(pool)
        .await
        .context("Failed to count blog posts")?;
    Ok(row.try_get("count")?)
}

async fn update_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<Option<Blog>> {
    let result = sqlx::query(UPDATE_SQL)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.image_url)
        .bind(blog.is_deleted)
        .bind(Utc::now())
        .bind(blog.id)
        .bind(false)
        .execute(pool)
        .await
        .context("Failed to update blog post")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(&select_by_id_sql())
        .bind(blog.id)
        .fetch_one(pool)
        .await
        .context("Failed to reload updated blog post")?;
    row_to_blog_sqlite(&row).map(Some)
}

async fn soft_delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query(SOFT_DELETE_SQL)
        .bind(true)
        .bind(Utc::now())
        .bind(id)
        .bind(false)
        .execute(pool)
        .await
        .context("Failed to delete blog post")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_blog_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    Ok(Blog {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, blog: &Blog) -> Result<Blog> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_SQL)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.image_url)
        .bind(false)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create blog post")?;

    let id = result.last_insert_id() as i64;
    let row = sqlx::query(&select_by_id_sql())
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to reload created blog post")?;
    row_to_blog_mysql(&row)
}

async fn get_live_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query(&select_live_by_id_sql())
        .bind(id)
        .bind(false)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog post")?;
    row.as_ref().map(row_to_blog_mysql).transpose()
}

async fn title_taken_mysql(pool: &MySqlPool, title: &str, exclude_id: i64) -> Result<bool> {
    let row = sqlx::query(TITLE_TAKEN_SQL)
        .bind(title)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check blog title")?;
    Ok(row.try_get::<i64, _>("count")? > 0)
}

async fn list_live_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Blog>> {
    let rows = sqlx::query(&list_live_sql())
        .bind(false)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list blog posts")?;
    rows.iter().map(row_to_blog_mysql).collect()
}

async fn count_live_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query(COUNT_LIVE_SQL)
        .bind(false)
        .fetch_one(pool)
        .await
        .context("Failed to count blog posts")?;
    Ok(row.try_get("count")?)
}

async fn update_mysql(pool: &MySqlPool, blog: &Blog) -> Result<Option<Blog>> {
    let result = sqlx::query(UPDATE_SQL)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.image_url)
        .bind(blog.is_deleted)
        .bind(Utc::now())
        .bind(blog.id)
        .bind(false)
        .execute(pool)
        .await
        .context("Failed to update blog post")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(&select_by_id_sql())
        .bind(blog.id)
        .fetch_one(pool)
        .await
        .context("Failed to reload updated blog post")?;
    row_to_blog_mysql(&row).map(Some)
}

async fn soft_delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query(SOFT_DELETE_SQL)
        .bind(true)
        .bind(Utc::now())
        .bind(id)
        .bind(false)
        .execute(pool)
        .await
        .context("Failed to delete blog post")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_blog_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Blog> {
    Ok(Blog {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// PostgreSQL implementations
async fn create_postgres(pool: &PgPool, blog: &Blog) -> Result<Blog> {
    let now = Utc::now();
    let row = sqlx::query(&format!(
        "INSERT INTO blogs (title, excerpt, content, image_url, is_deleted, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
    ))
    .bind(&blog.title)
    .bind(&blog.excerpt)
    .bind(&blog.content)
    .bind(&blog.image_url)
    .bind(false)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create blog post")?;
    row_to_blog_postgres(&row)
}

async fn get_live_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM blogs WHERE id = $1 AND is_deleted = FALSE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get blog post")?;
    row.as_ref().map(row_to_blog_postgres).transpose()
}

async fn title_taken_postgres(pool: &PgPool, title: &str, exclude_id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM blogs WHERE title = $1 AND id <> $2")
        .bind(title)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check blog title")?;
    Ok(row.try_get::<i64, _>("count")? > 0)
}

async fn list_live_postgres(pool: &PgPool, offset: i64, limit: i64) -> Result<Vec<Blog>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM blogs WHERE is_deleted = FALSE \
         ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list blog posts")?;
    rows.iter().map(row_to_blog_postgres).collect()
}

async fn count_live_postgres(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM blogs WHERE is_deleted = FALSE")
        .fetch_one(pool)
        .await
        .context("Failed to count blog posts")?;
    Ok(row.try_get("count")?)
}

async fn update_postgres(pool: &PgPool, blog: &Blog) -> Result<Option<Blog>> {
    let row = sqlx::query(&format!(
        "UPDATE blogs SET title = $1, excerpt = $2, content = $3, image_url = $4, \
         is_deleted = $5, updated_at = $6 \
         WHERE id = $7 AND is_deleted = FALSE RETURNING {COLUMNS}"
    ))
    .bind(&blog.title)
    .bind(&blog.excerpt)
    .bind(&blog.content)
    .bind(&blog.image_url)
    .bind(blog.is_deleted)
    .bind(Utc::now())
    .bind(blog.id)
    .fetch_optional(pool)
    .await
    .context("Failed to update blog post")?;
    row.as_ref().map(row_to_blog_postgres).transpose()
}

async fn soft_delete_postgres(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE blogs SET is_deleted = TRUE, updated_at = $1 WHERE id = $2 AND is_deleted = FALSE",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to delete blog post")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_blog_postgres(row: &sqlx::postgres::PgRow) -> Result<Blog> {
    Ok(Blog {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::BlogInput;

    async fn setup() -> SqlxBlogRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxBlogRepository::new(pool)
    }

    fn blog(title: &str) -> Blog {
        Blog::new(BlogInput::new(
            title,
            "An excerpt that is long enough",
            "Body of the post",
            "https://example.com/image.png",
        ))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = setup().await;

        let created = repo.create(&blog("First blog post")).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.title, "First blog post");
        assert!(!created.is_deleted);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_create_duplicate_title_is_unique_violation() {
        let repo = setup().await;
        repo.create(&blog("Duplicated title")).await.unwrap();

        let err = repo.create(&blog("Duplicated title")).await.unwrap_err();
        let is_unique = err
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        assert!(is_unique, "unexpected error: {err:#}");
    }

    #[tokio::test]
    async fn test_get_live_by_id() {
        let repo = setup().await;
        let created = repo.create(&blog("Readable blog post")).await.unwrap();

        let found = repo.get_live_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));

        assert!(repo.get_live_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_post() {
        let repo = setup().await;
        let created = repo.create(&blog("Soon to be deleted")).await.unwrap();

        assert!(repo.soft_delete(created.id).await.unwrap());
        assert!(repo.get_live_by_id(created.id).await.unwrap().is_none());
        assert_eq!(repo.count_live().await.unwrap(), 0);

        // A second delete finds no live row
        assert!(!repo.soft_delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_refreshes_updated_at() {
        let repo = setup().await;
        let created = repo.create(&blog("Timestamped delete")).await.unwrap();

        repo.soft_delete(created.id).await.unwrap();

        let pool = sqlite(repo.pool.as_ref()).unwrap();
        let row = sqlx::query(&select_by_id_sql())
            .bind(created.id)
            .fetch_one(pool)
            .await
            .unwrap();
        let stored = row_to_blog_sqlite(&row).unwrap();
        assert!(stored.is_deleted);
        assert_eq!(stored.created_at, created.created_at);
        assert!(stored.updated_at > stored.created_at);
    }

    #[tokio::test]
    async fn test_title_taken_includes_deleted_rows() {
        let repo = setup().await;
        let created = repo.create(&blog("Taken title here")).await.unwrap();
        repo.soft_delete(created.id).await.unwrap();

        assert!(repo.title_taken("Taken title here", None).await.unwrap());
        assert!(!repo
            .title_taken("Taken title here", Some(created.id))
            .await
            .unwrap());
        assert!(!repo.title_taken("Free title here", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_live_newest_first_with_paging() {
        let repo = setup().await;
        let first = repo.create(&blog("Blog number one")).await.unwrap();
        let second = repo.create(&blog("Blog number two")).await.unwrap();
        let third = repo.create(&blog("Blog number three")).await.unwrap();
        repo.soft_delete(second.id).await.unwrap();

        let all = repo.list_live(&ListParams::default()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(repo.count_live().await.unwrap(), 2);

        let page_two = repo
            .list_live(&ListParams::new(2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].id, first.id);

        assert!(repo
            .list_live(&ListParams::new(2, 10).unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_writes_fields_and_refreshes_timestamp() {
        let repo = setup().await;
        let mut stored = repo.create(&blog("Original title")).await.unwrap();
        let created_at = stored.created_at;

        stored.apply(BlogInput::new(
            "Updated title",
            "An updated excerpt, long enough",
            "Updated body",
            "https://example.com/updated.png",
        ));
        let updated = repo.update(&stored).await.unwrap().unwrap();

        assert_eq!(updated.title, "Updated title");
        assert_eq!(updated.content, "Updated body");
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= created_at);
    }

    #[tokio::test]
    async fn test_update_can_flag_deleted() {
        let repo = setup().await;
        let mut stored = repo.create(&blog("Deleted by update")).await.unwrap();

        stored.is_deleted = true;
        let updated = repo.update(&stored).await.unwrap().unwrap();

        assert!(updated.is_deleted);
        assert!(repo.get_live_by_id(stored.id).await.unwrap().is_none());
        assert_eq!(repo.count_live().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_deleted_post_matches_nothing() {
        let repo = setup().await;
        let stored = repo.create(&blog("Deleted then updated")).await.unwrap();
        repo.soft_delete(stored.id).await.unwrap();

        assert_eq!(repo.update(&stored).await.unwrap(), None);
    }
}
