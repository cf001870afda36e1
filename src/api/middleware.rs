//! API middleware
//!
//! Contains the shared pieces every handler relies on:
//! - `AppState` holding the services
//! - `ApiError`, the single error response type
//! - Conversions from service errors and extractor rejections

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::path::ErrorKind,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::FieldError;
use crate::services::{BlogService, BlogServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub blog_service: Arc<BlogService>,
}

impl AppState {
    pub fn new(blog_service: BlogService) -> Self {
        Self {
            blog_service: Arc::new(blog_service),
        }
    }
}

/// Error detail: a plain message, or one entry per invalid field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

/// Error response for API errors, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a ErrorDetail,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            detail: ErrorDetail::Message(message.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn validation_error(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: ErrorDetail::Fields(errors),
        }
    }

    fn invalid_field(error: FieldError) -> Self {
        tracing::warn!(loc = ?error.loc, msg = %error.msg, "Request rejected");
        Self::validation_error(vec![error])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound => {
                tracing::warn!("{}", err);
                Self::not_found(err.to_string())
            }
            BlogServiceError::DuplicateTitle => {
                tracing::warn!("{}", err);
                Self::conflict(err.to_string())
            }
            BlogServiceError::ValidationError(errors) => {
                tracing::warn!(count = errors.len(), "Validation failed");
                Self::validation_error(errors)
            }
            BlogServiceError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                Self::internal_error("Database error occurred.")
            }
            BlogServiceError::InternalError(e) => {
                tracing::error!(error = %format!("{:#}", e), "Unexpected error");
                Self::internal_error("Internal server error.")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let error = match &rejection {
            JsonRejection::JsonDataError(_) => {
                parse_deserialize_error("body", &rejection.body_text())
            }
            JsonRejection::JsonSyntaxError(_) => FieldError::new(
                "json_invalid",
                &["body"],
                strip_prefix(&rejection.body_text()),
            ),
            JsonRejection::MissingJsonContentType(_) => FieldError::new(
                "model_attributes_type",
                &["body"],
                "Input should be a valid JSON object with content type application/json",
            ),
            _ => FieldError::new("value_error", &["body"], rejection.body_text()),
        };
        Self::invalid_field(error)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_field(parse_deserialize_error("query", &rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        let error = match &rejection {
            PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
                ErrorKind::ParseErrorAtKey {
                    key, expected_type, ..
                } => FieldError::new(
                    parse_kind(expected_type),
                    &["path", key.as_str()],
                    parse_message(expected_type),
                ),
                ErrorKind::ParseError { expected_type, .. }
                | ErrorKind::ParseErrorAtIndex { expected_type, .. } => FieldError::new(
                    parse_kind(expected_type),
                    &["path"],
                    parse_message(expected_type),
                ),
                other => FieldError::new("value_error", &["path"], other.to_string()),
            },
            _ => {
                tracing::error!(error = %rejection.body_text(), "Path extraction failed");
                return Self::internal_error("Internal server error.");
            }
        };
        Self::invalid_field(error)
    }
}

fn parse_kind(expected_type: &str) -> &'static str {
    if expected_type.starts_with('i') || expected_type.starts_with('u') {
        "int_parsing"
    } else {
        "value_error"
    }
}

fn parse_message(expected_type: &str) -> String {
    if parse_kind(expected_type) == "int_parsing" {
        "Input should be a valid integer, unable to parse string as an integer".to_string()
    } else {
        format!("Input should be a valid {}", expected_type)
    }
}

/// Drop axum's "Failed to ...: " prefix from a rejection message
fn strip_prefix(text: &str) -> String {
    text.split_once(": ")
        .map(|(_, rest)| rest)
        .unwrap_or(text)
        .to_string()
}

/// Turn a serde deserialization message into a field error.
///
/// Messages look like `title: invalid type: integer `5`, expected a string`
/// or `missing field `content``, optionally followed by a line/column suffix.
fn parse_deserialize_error(root: &str, text: &str) -> FieldError {
    let message = strip_prefix(text);

    if let Some(rest) = message.split_once("missing field `").map(|(_, r)| r) {
        if let Some((field, _)) = rest.split_once('`') {
            return FieldError::new("missing", &[root, field], "Field required");
        }
    }

    if let Some((path, detail)) = message.split_once(": ") {
        let is_path = !path.is_empty()
            && path
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '[' || c == ']');
        if is_path {
            let mut loc = vec![root];
            loc.extend(path.split('.'));
            return FieldError::new(detail_kind(detail), &loc, detail);
        }
    }

    FieldError::new(detail_kind(&message), &[root], message.as_str())
}

fn detail_kind(detail: &str) -> &'static str {
    if detail.contains("invalid digit") || detail.contains("expected i64") {
        "int_parsing"
    } else if detail.starts_with("invalid type") {
        "invalid_type"
    } else {
        "value_error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_message_body() {
        let (status, body) = body_json(ApiError::not_found("Blog post not found.")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"detail": "Blog post not found."}));
    }

    #[tokio::test]
    async fn test_field_errors_body() {
        let error = ApiError::validation_error(vec![FieldError::new(
            "missing",
            &["body", "content"],
            "Field required",
        )]);
        let (status, body) = body_json(error).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["type"], "missing");
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body", "content"]));
    }

    #[tokio::test]
    async fn test_service_errors_hide_internals() {
        let (status, body) =
            body_json(BlogServiceError::DatabaseError(sqlx::Error::PoolTimedOut).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Database error occurred.");

        let (status, body) =
            body_json(BlogServiceError::InternalError(anyhow::anyhow!("secret")).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error.");

        let (status, body) = body_json(BlogServiceError::DuplicateTitle.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], "A blog post with this title already exists.");
    }

    #[test]
    fn test_parse_missing_field() {
        let error = parse_deserialize_error(
            "body",
            "Failed to deserialize the JSON body into the target type: missing field `content` at line 1 column 40",
        );
        assert_eq!(error.kind, "missing");
        assert_eq!(error.loc, vec!["body", "content"]);
    }

    #[test]
    fn test_parse_field_path() {
        let error = parse_deserialize_error(
            "query",
            "Failed to deserialize query string: page: invalid digit found in string",
        );
        assert_eq!(error.kind, "int_parsing");
        assert_eq!(error.loc, vec!["query", "page"]);
        assert_eq!(error.msg, "invalid digit found in string");
    }

    #[test]
    fn test_parse_unrecognised_message() {
        let error = parse_deserialize_error("body", "something odd happened");
        assert_eq!(error.loc, vec!["body"]);
        assert_eq!(error.kind, "value_error");
    }
}
