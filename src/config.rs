//! Runtime configuration, built once at startup and passed to every stage.

use crate::cli::Cli;
use crate::errors::ConfigError;
use std::time::Duration;
use url::Url;

/// Credentials for the destination WordPress site (application password).
#[derive(Clone)]
pub struct WpCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for WpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WpCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub news_api_key: String,
    pub llm_api_key: String,
    pub wp: WpCredentials,
    pub wordpress_url: String,
    pub news_api_url: String,
    pub llm_api_url: String,
    pub models: Vec<String>,
    pub discover_models: bool,
    pub topic: Option<String>,
    pub site_name: String,
    pub default_category_id: u64,
    pub publish_attempts: usize,
    pub publish_retry_delay: Duration,
    pub publish_timeout: Duration,
    pub dry_run: bool,
}

impl Config {
    /// Validate parsed arguments. Every missing credential is reported in one
    /// error so a misconfigured job can be fixed in a single pass.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let news_api_key = required(cli.news_api_key, "NEWS_API_KEY", &mut missing);
        let llm_api_key = required(cli.llm_api_key, "LLM_API_KEY", &mut missing);
        let wp_user = required(cli.wp_user, "WP_USER", &mut missing);
        let wp_password = required(cli.wp_password, "WP_PASSWORD", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let models: Vec<String> = cli
            .models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(ConfigError::NoModels);
        }

        Ok(Self {
            news_api_key,
            llm_api_key,
            wp: WpCredentials {
                user: wp_user,
                password: wp_password,
            },
            wordpress_url: base_url("WORDPRESS_URL", &cli.wordpress_url)?,
            news_api_url: base_url("NEWS_API_URL", &cli.news_api_url)?,
            llm_api_url: base_url("LLM_API_URL", &cli.llm_api_url)?,
            models,
            discover_models: cli.discover_models,
            topic: cli.topic.filter(|t| !t.trim().is_empty()),
            site_name: cli.site_name,
            default_category_id: cli.default_category_id,
            publish_attempts: cli.publish_attempts.max(1),
            publish_retry_delay: Duration::from_secs(cli.publish_retry_delay_secs),
            publish_timeout: Duration::from_secs(30),
            dry_run: cli.dry_run,
        })
    }

    /// Join a path onto the WordPress REST base.
    pub fn wp_endpoint(&self, path: &str) -> String {
        join(&self.wordpress_url, path)
    }

    pub fn news_endpoint(&self, path: &str) -> String {
        join(&self.news_api_url, path)
    }

    pub fn llm_endpoint(&self, path: &str) -> String {
        join(&self.llm_api_url, path)
    }
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn base_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Configuration pointing every service at one base URL (a mock server).
#[cfg(test)]
pub fn test_config(base: &str) -> Config {
    Config {
        news_api_key: "news-key".to_string(),
        llm_api_key: "llm-key".to_string(),
        wp: WpCredentials {
            user: "editor".to_string(),
            password: "app pass word".to_string(),
        },
        wordpress_url: format!("{base}/wp-json/wp/v2"),
        news_api_url: format!("{base}/newsapi/v2"),
        llm_api_url: format!("{base}/gemini/v1beta"),
        models: vec!["model-a".to_string(), "model-b".to_string()],
        discover_models: false,
        topic: None,
        site_name: "Wandering Science".to_string(),
        default_category_id: 2,
        publish_attempts: 3,
        publish_retry_delay: Duration::ZERO,
        publish_timeout: Duration::from_secs(5),
        dry_run: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut all = vec!["wandering_science"];
        all.extend_from_slice(args);
        Cli::parse_from(all)
    }

    #[test]
    fn test_missing_credentials_are_all_reported() {
        let err = Config::from_cli(cli(&["--news-api-key", "n", "--wp-user", "  "])).unwrap_err();
        match err {
            ConfigError::Missing(names) => {
                assert_eq!(names, vec!["LLM_API_KEY", "WP_USER", "WP_PASSWORD"]);
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::from_cli(cli(&[
            "--news-api-key",
            "n",
            "--llm-api-key",
            "l",
            "--wp-user",
            "u",
            "--wp-password",
            "p",
            "--wordpress-url",
            "https://example.org/wp-json/wp/v2/",
        ]))
        .unwrap();

        assert_eq!(config.wp_endpoint("posts"), "https://example.org/wp-json/wp/v2/posts");
        assert_eq!(config.publish_attempts, 3);
        assert!(!format!("{:?}", config.wp).contains("\"p\""));
    }

    #[test]
    fn test_invalid_url() {
        let err = Config::from_cli(cli(&[
            "--news-api-key",
            "n",
            "--llm-api-key",
            "l",
            "--wp-user",
            "u",
            "--wp-password",
            "p",
            "--news-api-url",
            "not a url",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "NEWS_API_URL", .. }));
    }

    #[test]
    fn test_empty_cascade() {
        let err = Config::from_cli(cli(&[
            "--news-api-key",
            "n",
            "--llm-api-key",
            "l",
            "--wp-user",
            "u",
            "--wp-password",
            "p",
            "--models",
            " ",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoModels));
    }
}
