//! Command-line interface definitions for Wandering Science.
//!
//! Every option is backed by an environment variable so the scheduled job can
//! run with no flags at all. Credentials are declared optional here and
//! validated in [`crate::config::Config::from_cli`], which reports all missing
//! variables at once instead of stopping at the first.

use clap::Parser;

pub const DEFAULT_WORDPRESS_URL: &str = "https://www.wanderingscience.com/wp-json/wp/v2";
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_LLM_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Command-line arguments for the Wandering Science publisher.
///
/// # Examples
///
/// ```sh
/// # Typical scheduled run, everything from the environment
/// NEWS_API_KEY=... LLM_API_KEY=... WP_USER=... WP_PASSWORD=... wandering_science
///
/// # Pin the topic group and try a single model
/// wandering_science --topic astronomy --models gemini-1.5-flash
///
/// # Do everything except the final publish call
/// wandering_science --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News search API key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Generative-language API key
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// WordPress username
    #[arg(long, env = "WP_USER")]
    pub wp_user: Option<String>,

    /// WordPress application password
    #[arg(long, env = "WP_PASSWORD", hide_env_values = true)]
    pub wp_password: Option<String>,

    /// WordPress REST base (up to and including `/wp/v2`)
    #[arg(long, env = "WORDPRESS_URL", default_value = DEFAULT_WORDPRESS_URL)]
    pub wordpress_url: String,

    /// News search API base
    #[arg(long, env = "NEWS_API_URL", default_value = DEFAULT_NEWS_API_URL)]
    pub news_api_url: String,

    /// Generative-language API base
    #[arg(long, env = "LLM_API_URL", default_value = DEFAULT_LLM_API_URL)]
    pub llm_api_url: String,

    /// Model cascade, tried in order until one succeeds
    #[arg(
        long,
        env = "LLM_MODELS",
        value_delimiter = ',',
        default_values = [
            "gemini-2.0-flash-exp",
            "gemini-1.5-flash",
            "gemini-1.5-flash-8b",
            "gemini-1.0-pro",
        ]
    )]
    pub models: Vec<String>,

    /// Narrow the cascade to models the API currently lists
    #[arg(long, env = "LLM_DISCOVER_MODELS")]
    pub discover_models: bool,

    /// Pin the scout to one topic group instead of a weighted random pick
    #[arg(long, env = "SCOUT_TOPIC")]
    pub topic: Option<String>,

    /// Site name used in the writer persona
    #[arg(long, env = "SITE_NAME", default_value = "Wandering Science")]
    pub site_name: String,

    /// Category id used when no keyword rule matches
    #[arg(long, env = "WP_DEFAULT_CATEGORY", default_value_t = 2)]
    pub default_category_id: u64,

    /// Total publish attempts on transport failure
    #[arg(long, env = "PUBLISH_ATTEMPTS", default_value_t = 3)]
    pub publish_attempts: usize,

    /// Fixed delay between publish attempts, in seconds
    #[arg(long, env = "PUBLISH_RETRY_DELAY_SECS", default_value_t = 5)]
    pub publish_retry_delay_secs: u64,

    /// Run every stage except the final publish call
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["wandering_science"]);

        assert_eq!(cli.wordpress_url, DEFAULT_WORDPRESS_URL);
        assert_eq!(cli.models.len(), 4);
        assert_eq!(cli.models[0], "gemini-2.0-flash-exp");
        assert_eq!(cli.default_category_id, 2);
        assert_eq!(cli.publish_attempts, 3);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_models_are_comma_separated() {
        let cli = Cli::parse_from([
            "wandering_science",
            "--models",
            "gemini-1.5-flash,gemini-1.0-pro",
            "--topic",
            "astronomy",
        ]);

        assert_eq!(cli.models, vec!["gemini-1.5-flash", "gemini-1.0-pro"]);
        assert_eq!(cli.topic.as_deref(), Some("astronomy"));
    }
}
