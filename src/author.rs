//! Author: turn a story into a long-form HTML feature.
//!
//! The persona and formatting contract live in [`system_instruction`]. They are
//! prompt-level rules; the model's compliance is not checked here.

use crate::api::{GeminiClient, Prompt, TextGenerator};
use crate::cascade::{first_success, narrow_to_available};
use crate::config::Config;
use crate::errors::ServiceError;
use crate::models::Article;
use crate::utils::strip_code_fences;
use tracing::{info, instrument, warn};

/// Phrases the writer must never use.
pub const FORBIDDEN_PHRASES: &[&str] = &[
    "delve",
    "testament",
    "tapestry",
    "unmasking",
    "landscape",
    "in conclusion",
];

pub const MIN_WORDS: usize = 1200;

/// Fixed persona, formatting rules and article structure.
///
/// The image embed rule is only included when an image was hosted; without
/// one the model is not asked to reference a URL that does not exist.
pub fn system_instruction(site_name: &str, article: &Article, image_url: &str) -> String {
    let title = &article.title;
    let source = article.source_name();
    let forbidden = FORBIDDEN_PHRASES
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let image_rule = if image_url.trim().is_empty() {
        String::new()
    } else {
        format!(
            "2. MANDATORY IMAGE EMBED: Include this exact HTML tag around paragraph 3:\n   \
             <figure class=\"wp-block-image aligncenter size-large\"><img src=\"{image_url}\" alt=\"Scientific context visualization\"/><figcaption>Visual context from {source}.</figcaption></figure>\n"
        )
    };

    format!(
        "You are the Senior Editor for '{site_name}'. You bridge the gap between rigorous academic research and the spirit of exploration.\n\
         \n\
         YOUR TASK: Write a long-form feature article of at least {MIN_WORDS} words on the provided topic.\n\
         \n\
         CRITICAL FORMATTING RULES:\n\
         1. OUTPUT PURE HTML ONLY. Use <h2>/<h3> for headers, <strong>/<em> for emphasis and <blockquote> for quotes. No Markdown (No #, No *, No backticks).\n\
         {image_rule}\
         \n\
         TONE & STYLE:\n\
         - Intellectual, narrative-driven journalism (think 'The Atlantic' or 'National Geographic').\n\
         - Start with a scene, a question, or a sensory detail. Do not start with \"A new study says\".\n\
         - NO AI PATTERNS: Never use {forbidden}.\n\
         \n\
         STRUCTURE:\n\
         1. <h1>{title}</h1>\n\
         2. The Narrative Hook (Draw the reader in)\n\
         3. The Hard Science (Explain the mechanism/discovery depth)\n\
         4. The Broader Context (Why this matters to our understanding of the universe/earth)\n\
         5. The Traveler's Perspective (Where can a non-scientist go to witness this? Museums? Field sites?)\n"
    )
}

pub fn user_prompt(article: &Article) -> String {
    format!(
        "HEADLINE: {}\nSUMMARY: {}\nSOURCE: {}\n\nWrite the article now. Start directly with the <h1> tag.",
        article.title,
        article.description(),
        article.source_name()
    )
}

/// Closing block linking back to the original reporting.
pub fn source_footer(article: &Article) -> String {
    format!(
        "\n<hr class=\"wp-block-separator has-alpha-channel-opacity\"/>\n\
         <div class=\"article-source\" style=\"margin-top: 2rem; font-style: italic; color: #555;\">\n\
         <p><strong>Source:</strong> <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Read the original reporting at {}</a></p>\n\
         </div>\n",
        article.url,
        article.source_name()
    )
}

/// Cascade to use for this run. With discovery enabled, models the service
/// does not list are dropped; a failed lookup keeps the declared list.
#[instrument(level = "info", skip_all)]
pub async fn resolve_models(client: &GeminiClient<'_>, config: &Config) -> Vec<String> {
    if !config.discover_models {
        return config.models.clone();
    }
    match client.list_models().await {
        Ok(available) => {
            let models = narrow_to_available(&config.models, &available);
            info!(?models, "Cascade after discovery");
            models
        }
        Err(e) => {
            warn!(error = %e, "Model discovery failed; using declared cascade");
            config.models.clone()
        }
    }
}

/// Write the feature. Returns `(title, html)`, or `None` when every model in
/// the cascade failed.
#[instrument(level = "info", skip_all, fields(title = %article.title, has_image = !image_url.is_empty()))]
pub async fn write_article<G: TextGenerator>(
    generator: &G,
    models: &[String],
    site_name: &str,
    article: &Article,
    image_url: &str,
) -> Option<(String, String)> {
    let prompt = Prompt {
        system: system_instruction(site_name, article, image_url),
        user: user_prompt(article),
    };

    let (model, html) = first_success(models, |model| {
        let prompt = &prompt;
        async move {
            let html = strip_code_fences(&generator.generate(model, prompt).await?);
            if html.is_empty() {
                return Err(ServiceError::EmptyResponse { service: "gemini" });
            }
            Ok::<_, ServiceError>(html)
        }
    })
    .await?;

    info!(%model, chars = html.len(), "Article written");
    Some((article.title.clone(), html + &source_footer(article)))
}
