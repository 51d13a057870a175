//! Data models for the pipeline and the wire shapes of the external services.
//!
//! - [`Article`]: a candidate story from the news search API
//! - [`MediaAsset`]: an image re-hosted in the WordPress media library
//! - [`GeneratedPost`]: the finished post handed to the publisher
//! - `Wp*` / `News*`: response bodies, decoded only as far as we use them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source block of a news search result.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleSource {
    /// Publication name, e.g. "Phys.org".
    #[serde(default)]
    pub name: Option<String>,
}

/// A candidate article as returned by the news search API.
///
/// Only lives for a single run. Field names follow the API's camelCase JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Publisher block.
    #[serde(default)]
    pub source: ArticleSource,
    /// Headline. Empty when the API sent `null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Short summary, fed to the writer as context.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to the original story, used in the source footer.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Lead image; stories without one never qualify.
    #[serde(default)]
    pub url_to_image: Option<String>,
    /// Raw RFC 3339 timestamp. Parsed lazily by [`Article::published`].
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Article {
    pub fn source_name(&self) -> &str {
        self.source
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("the original source")
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Publication time, when the API sent a parseable RFC 3339 timestamp.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// The image URL, if present and non-blank.
    pub fn image_url(&self) -> Option<&str> {
        self.url_to_image.as_deref().filter(|u| !u.trim().is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a news search response.
///
/// Errors come back with `status: "error"` plus `code` and `message`.
#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Machine-readable error code, e.g. `apiKeyInvalid`.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// An image persisted in the destination media library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Media id, used as the post's `featured_media`.
    pub id: u64,
    /// Public URL of the hosted copy. `None` when the site did not report one;
    /// the image is then featured but not embedded.
    pub source_url: Option<String>,
}

/// A post ready to publish. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    /// Post title, the story headline.
    pub title: String,
    /// Generated HTML with the source footer appended.
    pub body: String,
    /// Resolved WordPress category id.
    pub category_id: u64,
    /// Media id of the re-hosted image, if the upload succeeded.
    pub featured_media: Option<u64>,
}

impl GeneratedPost {
    /// Only posts with both a title and a body are ever published.
    pub fn is_publishable(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

/// Request body for `POST /posts`.
#[derive(Debug, Serialize)]
pub struct WpNewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: &'a str,
    pub categories: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

/// A post as listed or created by the WordPress REST API.
#[derive(Debug, Deserialize)]
pub struct WpPost {
    /// Post id.
    pub id: u64,
    /// Public permalink.
    #[serde(default)]
    pub link: Option<String>,
}

/// A category from `GET /categories`.
#[derive(Debug, Deserialize)]
pub struct WpCategory {
    /// Category id, sent in a new post's `categories`.
    pub id: u64,
    /// Display name, matched against the rule's category name.
    pub name: String,
}

/// A media item as returned by `POST /media`.
#[derive(Debug, Deserialize)]
pub struct WpMedia {
    /// Media id.
    pub id: u64,
    /// URL of the uploaded file.
    #[serde(default)]
    pub source_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserialization() {
        let json = r#"{
            "source": {"id": null, "name": "Phys.org"},
            "author": "Someone",
            "title": "Ancient Reef Found",
            "description": "A reef under the ice.",
            "url": "https://phys.org/news/reef.html",
            "urlToImage": "https://phys.org/img/reef.jpg",
            "publishedAt": "2025-05-06T14:30:00Z",
            "content": "..."
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.source_name(), "Phys.org");
        assert_eq!(article.image_url(), Some("https://phys.org/img/reef.jpg"));
        assert_eq!(article.published().unwrap().to_rfc3339(), "2025-05-06T14:30:00+00:00");
    }

    #[test]
    fn test_article_missing_optional_fields() {
        let json = r#"{"source": {"name": null}, "title": null, "url": "u", "urlToImage": "  "}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.title, "");
        assert_eq!(article.image_url(), None);
        assert_eq!(article.description(), "");
        assert_eq!(article.source_name(), "the original source");
        assert_eq!(article.published(), None);
    }

    #[test]
    fn test_news_error_response() {
        let json = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let response: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "error");
        assert!(response.articles.is_empty());
        assert_eq!(response.code.as_deref(), Some("apiKeyInvalid"));
    }

    #[test]
    fn test_new_post_omits_missing_media() {
        let body = WpNewPost {
            title: "T",
            content: "<p>x</p>",
            status: "publish",
            categories: vec![2],
            featured_media: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["categories"], serde_json::json!([2]));
        assert!(json.get("featured_media").is_none());
    }

    #[test]
    fn test_publishable() {
        let mut post = GeneratedPost {
            title: "Title".to_string(),
            body: "<p>Body</p>".to_string(),
            category_id: 2,
            featured_media: None,
        };
        assert!(post.is_publishable());
        post.body = "   ".to_string();
        assert!(!post.is_publishable());
    }
}
