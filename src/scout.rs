//! Story Scout: pick one fresh, illustrated science story.
//!
//! # Selection
//!
//! 1. Choose a topic group (pinned by config, else weighted random).
//! 2. Query the news search API, newest first, restricted to [`DOMAINS`].
//! 3. Keep articles that have an image and were not pulled by the source.
//! 4. Walk the survivors newest first and return the first one the
//!    destination site has not published yet.
//!
//! Finding nothing is a normal outcome (`Ok(None)`), not an error.

use crate::config::Config;
use crate::errors::ServiceError;
use crate::models::{Article, NewsResponse};
use crate::utils::{decode_json, ensure_success};
use crate::wordpress::WordPress;
use itertools::Itertools;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "newsapi";
const NEWS_TIMEOUT: Duration = Duration::from_secs(20);
const PAGE_SIZE: &str = "50";

/// Marker the news API puts in the title of articles the publisher withdrew.
pub const REMOVED_MARKER: &str = "removed";

/// Publications the scout is allowed to pull from.
pub const DOMAINS: &[&str] = &[
    "nature.com",
    "scientificamerican.com",
    "sciencenews.org",
    "nationalgeographic.com",
    "smithsonianmag.com",
    "phys.org",
    "theguardian.com",
    "bbc.com",
];

/// A group of search keywords and how often it should be drawn.
#[derive(Debug, Clone, Copy)]
pub struct TopicGroup {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub weight: u32,
}

pub const TOPIC_GROUPS: &[TopicGroup] = &[
    TopicGroup {
        label: "general",
        keywords: &[
            "astronomy",
            "geology",
            "biology",
            "neuroscience",
            "climate change",
            "archaeology",
            "physics",
        ],
        weight: 4,
    },
    TopicGroup {
        label: "astronomy",
        keywords: &["astronomy", "telescope", "exoplanet", "galaxy", "meteor shower", "eclipse"],
        weight: 2,
    },
    TopicGroup {
        label: "earth",
        keywords: &["geology", "volcano", "earthquake", "glacier", "fossil", "cave"],
        weight: 2,
    },
    TopicGroup {
        label: "life",
        keywords: &["biology", "ecology", "entomology", "marine biology", "species", "migration"],
        weight: 2,
    },
    TopicGroup {
        label: "past",
        keywords: &["archaeology", "ancient", "excavation", "paleontology"],
        weight: 1,
    },
];

/// Boolean keyword query, e.g. `(astronomy OR "climate change")`.
pub fn build_query(group: &TopicGroup) -> String {
    let terms = group
        .keywords
        .iter()
        .map(|k| {
            if k.contains(' ') {
                format!("\"{k}\"")
            } else {
                k.to_string()
            }
        })
        .join(" OR ");
    format!("({terms})")
}

/// A pinned label wins when it names a known group; otherwise draw by weight.
pub fn choose_topic(groups: &'static [TopicGroup], pinned: Option<&str>) -> &'static TopicGroup {
    if let Some(label) = pinned {
        match groups.iter().find(|g| g.label.eq_ignore_ascii_case(label.trim())) {
            Some(group) => return group,
            None => warn!(%label, "Unknown topic group; drawing at random"),
        }
    }
    match WeightedIndex::new(groups.iter().map(|g| g.weight)) {
        Ok(dist) => &groups[dist.sample(&mut rand::rng())],
        Err(_) => &groups[0],
    }
}

/// Has an image and was not withdrawn by its source.
pub fn qualifies(article: &Article) -> bool {
    article.image_url().is_some()
        && !article.title.trim().is_empty()
        && !article.title.to_lowercase().contains(REMOVED_MARKER)
}

/// Qualifying articles, most recent first. Undated articles keep their API
/// order behind the dated ones.
pub fn rank(articles: Vec<Article>) -> Vec<Article> {
    let mut kept: Vec<Article> = articles.into_iter().filter(qualifies).collect();
    kept.sort_by(|a, b| b.published().cmp(&a.published()));
    kept
}

/// Query the news search API for one topic group.
#[instrument(level = "info", skip_all, fields(topic = %group.label))]
pub async fn fetch_candidates(
    http: &reqwest::Client,
    config: &Config,
    group: &TopicGroup,
) -> Result<Vec<Article>, ServiceError> {
    let query = build_query(group);
    let domains = DOMAINS.join(",");
    debug!(%query, "Searching news");

    let response = http
        .get(config.news_endpoint("everything"))
        .query(&[
            ("q", query.as_str()),
            ("domains", domains.as_str()),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("pageSize", PAGE_SIZE),
            ("apiKey", config.news_api_key.as_str()),
        ])
        .timeout(NEWS_TIMEOUT)
        .send()
        .await?;

    let news: NewsResponse = decode_json(SERVICE, ensure_success(SERVICE, response).await?).await?;
    if news.status != "ok" {
        return Err(ServiceError::Api {
            service: SERVICE,
            message: format!(
                "{}: {}",
                news.code.unwrap_or_else(|| news.status.clone()),
                news.message.unwrap_or_default()
            ),
        });
    }
    info!(count = news.articles.len(), "News search returned");
    Ok(news.articles)
}

/// Duplicate check: any post found by a title search means the story ran
/// already. A failed lookup is logged and treated as "not a duplicate".
#[instrument(level = "info", skip(wp))]
pub async fn is_duplicate(wp: &WordPress<'_>, title: &str) -> bool {
    match wp.search_posts(title, 1).await {
        Ok(posts) => !posts.is_empty(),
        Err(e) => {
            warn!(error = %e, "Duplicate check failed; assuming fresh");
            false
        }
    }
}

/// Run the whole scout stage.
#[instrument(level = "info", skip_all)]
pub async fn find_story(
    http: &reqwest::Client,
    config: &Config,
) -> Result<Option<Article>, ServiceError> {
    let group = choose_topic(TOPIC_GROUPS, config.topic.as_deref());
    let articles = fetch_candidates(http, config, group).await?;
    let total = articles.len();
    let candidates = rank(articles);

    if candidates.is_empty() {
        info!(total, "No candidates with a usable image");
        return Ok(None);
    }
    info!(candidates = candidates.len(), total, "Checking candidates for duplicates");

    let wp = WordPress::new(http, config);
    for article in candidates {
        if is_duplicate(&wp, &article.title).await {
            info!(title = %article.title, "Skipping duplicate");
            continue;
        }
        info!(title = %article.title, source = %article.source_name(), "Selected fresh story");
        return Ok(Some(article));
    }

    info!("All candidates were duplicates");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::ArticleSource;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(title: &str, image: Option<&str>, published: Option<&str>) -> Article {
        Article {
            source: ArticleSource {
                name: Some("Phys.org".to_string()),
            },
            title: title.to_string(),
            description: Some("desc".to_string()),
            url: format!("https://phys.org/{}", title.len()),
            url_to_image: image.map(str::to_string),
            published_at: published.map(str::to_string),
        }
    }

    #[test]
    fn test_build_query_quotes_phrases() {
        let group = TopicGroup {
            label: "t",
            keywords: &["astronomy", "climate change"],
            weight: 1,
        };
        assert_eq!(build_query(&group), "(astronomy OR \"climate change\")");
    }

    #[test]
    fn test_choose_topic_pinned() {
        let group = choose_topic(TOPIC_GROUPS, Some("Astronomy"));
        assert_eq!(group.label, "astronomy");
    }

    #[test]
    fn test_choose_topic_unknown_falls_back_to_draw() {
        let group = choose_topic(TOPIC_GROUPS, Some("cooking"));
        assert!(TOPIC_GROUPS.iter().any(|g| g.label == group.label));
    }

    #[test]
    fn test_qualifies() {
        assert!(qualifies(&article("Reef", Some("https://img"), None)));
        assert!(!qualifies(&article("Reef", None, None)));
        assert!(!qualifies(&article("Reef", Some(""), None)));
        assert!(!qualifies(&article("[Removed]", Some("https://img"), None)));
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let ranked = rank(vec![
            article("old", Some("i"), Some("2025-01-01T00:00:00Z")),
            article("no image", None, Some("2025-06-01T00:00:00Z")),
            article("undated", Some("i"), None),
            article("new", Some("i"), Some("2025-05-01T00:00:00Z")),
            article("[Removed]", Some("i"), Some("2025-07-01T00:00:00Z")),
        ]);
        let titles: Vec<&str> = ranked.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_duplicate_check_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("search", "Known Story"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])))
            .expect(2)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let wp = WordPress::new(&http, &config);
        let first = is_duplicate(&wp, "Known Story").await;
        let second = is_duplicate(&wp, "Known Story").await;
        assert!(first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_duplicate_check_failure_is_not_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        assert!(!is_duplicate(&WordPress::new(&http, &config), "Anything").await);
    }

    #[tokio::test]
    async fn test_news_error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/newsapi/v2/everything"))
            .and(query_param("sortBy", "publishedAt"))
            .and(query_param("apiKey", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error", "code": "rateLimited", "message": "Too many requests"
            })))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let err = find_story(&http, &config).await.unwrap_err();
        assert_eq!(err.to_string(), "newsapi error: rateLimited: Too many requests");
    }

    #[tokio::test]
    async fn test_find_story_skips_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/newsapi/v2/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "articles": [
                    {"source": {"name": "Nature"}, "title": "Seen Before", "url": "https://n/1",
                     "urlToImage": "https://n/1.jpg", "publishedAt": "2025-05-02T00:00:00Z"},
                    {"source": {"name": "Nature"}, "title": "Brand New", "url": "https://n/2",
                     "urlToImage": "https://n/2.jpg", "publishedAt": "2025-05-01T00:00:00Z"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("search", "Seen Before"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 3}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("search", "Brand New"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let http = reqwest::Client::new();
        let story = find_story(&http, &config).await.unwrap().unwrap();
        assert_eq!(story.title, "Brand New");
    }
}
