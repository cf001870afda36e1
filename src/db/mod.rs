//! Database layer
//!
//! This module provides database access for the blog API. It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL
//! - PostgreSQL
//!
//! The database driver is selected based on configuration. Repositories work
//! against the `DatabasePool` trait object and dispatch on its driver.
//!
//! # Usage
//!
//! ```ignore
//! use blog_api::config::DatabaseConfig;
//! use blog_api::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase,
    PostgresDatabase, SqliteDatabase,
};
