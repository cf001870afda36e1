//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP surface of the blog API:
//! - Blog API endpoints under `/api/v1`
//! - The welcome message at `/`
//! - JSON error responses for unknown paths and methods
//! - Request tracing and CORS

pub mod blogs;
pub mod common;
pub mod middleware;
pub mod responses;

use axum::{
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use responses::RootResponse;

pub use middleware::{ApiError, AppState};

/// Build the API router mounted at `/api/v1`
pub fn build_api_router() -> Router<AppState> {
    blogs::router()
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root).fallback(blogs::method_not_allowed))
        .nest("/api/v1", build_api_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origins)),
        )
        .with_state(state)
}

/// CORS for the configured origins with credentials.
///
/// Wildcards cannot be combined with credentials, so request methods and
/// headers are mirrored instead.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse::default())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxBlogRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::BlogService;
    use axum::http::{header, Method, StatusCode};
    use axum_test::TestServer;

    async fn setup_server(config: &ServerConfig) -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let state = AppState::new(BlogService::new(SqlxBlogRepository::boxed(pool)));
        TestServer::new(build_router(state, config)).expect("Failed to start test server")
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let server = setup_server(&ServerConfig::default()).await;

        let response = server
            .get("/api/v1/blogs")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "http://localhost:3000"
        );
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let server = setup_server(&ServerConfig::default()).await;

        let response = server
            .get("/api/v1/blogs")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://evil.example"))
            .await;

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight_mirrors_request() {
        let server = setup_server(&ServerConfig::default()).await;

        let response = server
            .method(Method::OPTIONS, "/api/v1/blogs")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:3001"))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("PATCH"),
            )
            .add_header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                HeaderValue::from_static("content-type"),
            )
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_METHODS), "PATCH");
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_HEADERS),
            "content-type"
        );
    }

    #[test]
    fn test_cors_layer_skips_invalid_origin() {
        // Building must not panic on a value that is not a header
        let _ = cors_layer(&["http://ok.example".to_string(), "bad\norigin".to_string()]);
    }
}
