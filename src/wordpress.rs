//! Thin client for the destination site's WordPress REST API (`/wp-json/wp/v2`).
//!
//! Every call authenticates with HTTP basic auth using an application password,
//! carries its own timeout, and maps failures onto [`ServiceError`].

use crate::config::Config;
use crate::errors::ServiceError;
use crate::models::{WpCategory, WpMedia, WpNewPost, WpPost};
use crate::utils::{decode_json, ensure_success};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, instrument};

const SERVICE: &str = "wordpress";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct WordPress<'a> {
    http: &'a reqwest::Client,
    config: &'a Config,
}

impl<'a> WordPress<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a Config) -> Self {
        Self { http, config }
    }

    /// `GET /posts?search=` limited to `per_page` results.
    #[instrument(level = "debug", skip(self))]
    pub async fn search_posts(&self, term: &str, per_page: u32) -> Result<Vec<WpPost>, ServiceError> {
        let per_page = per_page.to_string();
        let response = self
            .http
            .get(self.config.wp_endpoint("posts"))
            .query(&[("search", term), ("per_page", per_page.as_str())])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;
        let posts: Vec<WpPost> = decode_json(SERVICE, ensure_success(SERVICE, response).await?).await?;
        debug!(count = posts.len(), "Post search returned");
        Ok(posts)
    }

    /// `GET /categories?search=`.
    #[instrument(level = "debug", skip(self))]
    pub async fn search_categories(&self, term: &str) -> Result<Vec<WpCategory>, ServiceError> {
        let response = self
            .http
            .get(self.config.wp_endpoint("categories"))
            .query(&[("search", term), ("per_page", "100")])
            .basic_auth(&self.config.wp.user, Some(&self.config.wp.password))
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;
        decode_json(SERVICE, ensure_success(SERVICE, response).await?).await
    }

    /// `POST /media` with the raw image bytes as the body.
    #[instrument(level = "debug", skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn upload_media(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<WpMedia, ServiceError> {
        let response = self
            .http
            .post(self.config.wp_endpoint("media"))
            .basic_auth(&self.config.wp.user, Some(&self.config.wp.password))
            .header(CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;
        decode_json(SERVICE, ensure_success(SERVICE, response).await?).await
    }

    /// `POST /posts` with a JSON body. A single attempt; retrying is the
    /// publisher's call.
    #[instrument(level = "debug", skip_all, fields(title = %post.title))]
    pub async fn create_post(&self, post: &WpNewPost<'_>) -> Result<WpPost, ServiceError> {
        let response = self
            .http
            .post(self.config.wp_endpoint("posts"))
            .basic_auth(&self.config.wp.user, Some(&self.config.wp.password))
            .json(post)
            .timeout(self.config.publish_timeout)
            .send()
            .await?;
        decode_json(SERVICE, ensure_success(SERVICE, response).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_posts_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("search", "Ancient Reef Found"))
            .and(query_param("per_page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 7, "link": "https://site/reef"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let posts = WordPress::new(&http, &config)
            .search_posts("Ancient Reef Found", 1)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 7);
    }

    #[tokio::test]
    async fn test_upload_media_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/media"))
            .and(header("content-type", "image/png"))
            .and(header("content-disposition", "attachment; filename=\"science-reef.png\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 42, "source_url": "https://site/uploads/science-reef.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let media = WordPress::new(&http, &config)
            .upload_media(vec![1, 2, 3], "science-reef.png", "image/png")
            .await
            .unwrap();
        assert_eq!(media.id, 42);
        assert_eq!(media.source_url.as_deref(), Some("https://site/uploads/science-reef.png"));
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/categories"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden by firewall"))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let err = WordPress::new(&http, &config)
            .search_categories("Astronomy")
            .await
            .unwrap_err();
        match err {
            ServiceError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, "forbidden by firewall");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
