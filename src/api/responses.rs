//! Shared API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Blog, PagedResult};

/// Path the list endpoint is served under, used for navigation links
pub const BLOGS_PATH: &str = "/api/v1/blogs";

/// Full blog post response
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogResponse {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            excerpt: blog.excerpt,
            content: blog.content,
            image_url: blog.image_url,
            is_deleted: blog.is_deleted,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

/// Post summary used in listings
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogListItemResponse {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Blog> for BlogListItemResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            excerpt: blog.excerpt,
            image_url: blog.image_url,
            created_at: blog.created_at,
        }
    }
}

/// Paginated listing with navigation links
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogListResponse {
    /// Total number of live posts
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<BlogListItemResponse>,
}

impl From<PagedResult<Blog>> for BlogListResponse {
    fn from(page: PagedResult<Blog>) -> Self {
        let next = page
            .has_next()
            .then(|| page_link(page.page + 1, page.page_size));
        let previous = page
            .has_prev()
            .then(|| page_link(page.page - 1, page.page_size));

        Self {
            count: page.total,
            next,
            previous,
            results: page.items.into_iter().map(Into::into).collect(),
        }
    }
}

fn page_link(page: i64, page_size: i64) -> String {
    format!("{}?page={}&page_size={}", BLOGS_PATH, page, page_size)
}

/// Welcome message served at the root path
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl Default for RootResponse {
    fn default() -> Self {
        Self {
            message: "Welcome to API".to_string(),
            url: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlogInput, ListParams};

    fn blogs(count: usize) -> Vec<Blog> {
        (0..count)
            .map(|i| {
                let mut blog = Blog::new(BlogInput::new(
                    format!("Blog post {i:04}"),
                    "A summary of the blog post...",
                    "Body",
                    "img",
                ));
                blog.id = i as i64 + 1;
                blog
            })
            .collect()
    }

    #[test]
    fn test_first_page_links() {
        let params = ListParams::new(1, 1).unwrap();
        let response = BlogListResponse::from(PagedResult::new(blogs(1), 2, &params));

        assert_eq!(response.count, 2);
        assert_eq!(
            response.next.as_deref(),
            Some("/api/v1/blogs?page=2&page_size=1")
        );
        assert_eq!(response.previous, None);
    }

    #[test]
    fn test_last_page_links() {
        let params = ListParams::new(2, 1).unwrap();
        let response = BlogListResponse::from(PagedResult::new(blogs(1), 2, &params));

        assert_eq!(response.next, None);
        assert_eq!(
            response.previous.as_deref(),
            Some("/api/v1/blogs?page=1&page_size=1")
        );
    }

    #[test]
    fn test_list_item_omits_body() {
        let params = ListParams::default();
        let response = BlogListResponse::from(PagedResult::new(blogs(1), 1, &params));
        let json = serde_json::to_value(&response).unwrap();
        let item = &json["results"][0];

        assert_eq!(item["id"], 1);
        assert!(item.get("content").is_none());
        assert!(item.get("is_deleted").is_none());
        assert!(item.get("created_at").is_some());
    }

    #[test]
    fn test_root_response_shape() {
        let json = serde_json::to_value(RootResponse::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "Welcome to API", "URL": ""})
        );
    }
}
