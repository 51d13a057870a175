//! One run of the job, stage by stage.
//!
//! ```text
//! Scouting ─┬─ no story ──────────────────────────────────────────▶ Done
//!           └─ story ─▶ ImageUpload (best-effort)
//!                     ─▶ Category (best-effort)
//!                     ─▶ Authoring ─┬─ every model failed ────────▶ Done
//!                                   └─ title + body ─▶ Publishing ─▶ Done
//! ```
//!
//! Only an upstream failure of the news search surfaces as `Err`; every other
//! ending is a [`RunOutcome`].

use crate::api::GeminiClient;
use crate::author;
use crate::category;
use crate::config::Config;
use crate::errors::ServiceError;
use crate::media;
use crate::models::GeneratedPost;
use crate::publisher::{self, PublishOutcome};
use crate::scout;
use crate::wordpress::WordPress;
use tracing::{info, instrument, warn};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No qualifying article, or every candidate was already published.
    NoStory,
    /// Every model in the cascade failed.
    AuthoringFailed,
    /// Authoring produced an empty title or body.
    NothingToPublish,
    /// Dry run: everything but the publish call happened.
    DryRun { title: String },
    Published { link: String },
    /// The site rejected the post or stayed unreachable after retries.
    PublishFailed,
}

impl RunOutcome {
    /// Endings the scheduler should treat as a failed job.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PublishFailed)
    }
}

#[instrument(level = "info", skip_all, fields(dry_run = config.dry_run))]
pub async fn run(http: &reqwest::Client, config: &Config) -> Result<RunOutcome, ServiceError> {
    let Some(article) = scout::find_story(http, config).await? else {
        info!("No valid stories found today");
        return Ok(RunOutcome::NoStory);
    };

    let media = media::upload_image(http, config, article.image_url(), &article.title).await;
    let image_ref = media
        .as_ref()
        .and_then(|m| m.source_url.as_deref())
        .unwrap_or("");

    let wp = WordPress::new(http, config);
    let category_id =
        category::resolve_category(&wp, config, &article.title, article.description()).await;

    let client = GeminiClient::new(http, config);
    let models = author::resolve_models(&client, config).await;
    let Some((title, body)) =
        author::write_article(&client, &models, &config.site_name, &article, image_ref).await
    else {
        warn!("All models failed; nothing will be published");
        return Ok(RunOutcome::AuthoringFailed);
    };

    let post = GeneratedPost {
        title,
        body,
        category_id,
        featured_media: media.as_ref().map(|m| m.id),
    };
    if !post.is_publishable() {
        warn!("Generated post is missing a title or body");
        return Ok(RunOutcome::NothingToPublish);
    }

    if config.dry_run {
        info!(
            title = %post.title,
            chars = post.body.len(),
            category_id = post.category_id,
            featured_media = ?post.featured_media,
            "Dry run; skipping publish"
        );
        return Ok(RunOutcome::DryRun { title: post.title });
    }

    Ok(match publisher::publish(&wp, config, &post).await {
        Ok(PublishOutcome::Published { link }) => RunOutcome::Published { link },
        Ok(PublishOutcome::Skipped) => RunOutcome::NothingToPublish,
        Err(_) => RunOutcome::PublishFailed,
    })
}
