//! Blog API endpoints
//!
//! - `POST   /blogs`       create a post
//! - `GET    /blogs`       list live posts
//! - `GET    /blogs/{id}`  fetch a post
//! - `PATCH  /blogs/{id}`  replace a post's fields
//! - `DELETE /blogs/{id}`  soft delete a post

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::{AppJson, AppPath, AppQuery, BlogId, PaginationQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{BlogListResponse, BlogResponse};
use crate::models::{BlogPayload, ListParams};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/blogs",
            post(create_blog)
                .get(list_blogs)
                .fallback(method_not_allowed),
        )
        .route(
            "/blogs/{id}",
            get(get_blog)
                .patch(update_blog)
                .delete(delete_blog)
                .fallback(method_not_allowed),
        )
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn create_blog(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BlogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input().map_err(ApiError::validation_error)?;
    let blog = state.blog_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(BlogResponse::from(blog))))
}

async fn list_blogs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size).map_err(ApiError::validation_error)?;
    let page = state.blog_service.list(&params).await?;
    Ok(Json(page.into()))
}

async fn get_blog(
    State(state): State<AppState>,
    AppPath(BlogId { id }): AppPath<BlogId>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = state.blog_service.get(id).await?;
    Ok(Json(blog.into()))
}

async fn update_blog(
    State(state): State<AppState>,
    AppPath(BlogId { id }): AppPath<BlogId>,
    AppJson(payload): AppJson<BlogPayload>,
) -> Result<Json<BlogResponse>, ApiError> {
    let input = payload.into_input().map_err(ApiError::validation_error)?;
    let blog = state.blog_service.update(id, input).await?;
    Ok(Json(blog.into()))
}

async fn delete_blog(
    State(state): State<AppState>,
    AppPath(BlogId { id }): AppPath<BlogId>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
