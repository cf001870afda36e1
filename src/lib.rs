//! blog-api - A small blog posts JSON API
//!
//! This library provides the HTTP API, persistence and configuration for
//! managing blog posts with soft delete and pagination.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;
