//! Publisher: create the live post on the destination site.
//!
//! # Retry Strategy
//!
//! - Up to `publish_attempts` total attempts (3 by default)
//! - Fixed delay between attempts (`publish_retry_delay`, 5 seconds by default)
//! - Only transport failures (connect errors, timeouts) are retried
//! - A well-formed error response (any non-2xx) ends publishing immediately
//! - A 2xx whose body cannot be read means the post exists; it is reported as
//!   published with an unknown link and never sent again

use crate::config::Config;
use crate::errors::ServiceError;
use crate::models::{GeneratedPost, WpNewPost};
use crate::wordpress::WordPress;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// What happened to the post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Title or body was empty; no request was made.
    Skipped,
    /// The post is live at `link`. Empty when the site accepted the post but
    /// its response could not be read.
    Published { link: String },
}

/// Publish `post`, retrying only on transport failure.
#[instrument(level = "info", skip_all, fields(title = %post.title, category = post.category_id, media = ?post.featured_media))]
pub async fn publish(
    wp: &WordPress<'_>,
    config: &Config,
    post: &GeneratedPost,
) -> Result<PublishOutcome, ServiceError> {
    if !post.is_publishable() {
        info!("Nothing to publish");
        return Ok(PublishOutcome::Skipped);
    }

    let body = WpNewPost {
        title: &post.title,
        content: &post.body,
        status: "publish",
        categories: vec![post.category_id],
        featured_media: post.featured_media,
    };

    let total_t0 = Instant::now();
    let max_attempts = config.publish_attempts.max(1);
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        match wp.create_post(&body).await {
            Ok(created) => {
                let link = created.link.unwrap_or_default();
                info!(
                    post_id = created.id,
                    %link,
                    attempt,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    "Article live"
                );
                return Ok(PublishOutcome::Published { link });
            }
            Err(e) if e.is_unreadable_success() => {
                warn!(attempt, error = %e, "Post accepted but response unreadable; link unknown");
                return Ok(PublishOutcome::Published { link: String::new() });
            }
            Err(e) if e.is_transport() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max = max_attempts,
                    delay = ?config.publish_retry_delay,
                    error = %e,
                    "Publish attempt failed; retrying"
                );
                sleep(config.publish_retry_delay).await;
            }
            Err(e) => {
                error!(
                    attempt,
                    max = max_attempts,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    error = %e,
                    "Publish failed"
                );
                return Err(e);
            }
        }
    }
}
