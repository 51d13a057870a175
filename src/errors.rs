//! Error types shared by the pipeline stages.
//!
//! Two families exist:
//! - [`ConfigError`]: fatal, raised before any network activity.
//! - [`ServiceError`]: a failed call to one of the external HTTP services.
//!   Stages convert these into degraded outcomes (no image, next model,
//!   default category) or halt the run without publishing.

use reqwest::StatusCode;
use thiserror::Error;

/// Configuration problems detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid url for {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("model cascade is empty")]
    NoModels,
}

/// A failed call to the news, generative-text, or WordPress service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("{service} rate limited")]
    RateLimited { service: &'static str },

    #[error("{service} returned no content")]
    EmptyResponse { service: &'static str },

    /// The status line arrived but reading the body failed.
    #[error("could not read {service} response body: {source}")]
    Body {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("image is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("could not decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    /// Network-level failures before any status line arrived (connect, timeout).
    /// Only these are worth retrying; a well-formed error response is final.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The service answered 2xx but its body could not be read or decoded.
    /// Whatever was requested has already happened.
    pub fn is_unreadable_success(&self) -> bool {
        matches!(self, Self::Body { .. } | Self::Decode { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn decode(service: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { service, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lists_every_variable() {
        let err = ConfigError::Missing(vec!["NEWS_API_KEY", "WP_PASSWORD"]);
        assert_eq!(
            err.to_string(),
            "missing required configuration: NEWS_API_KEY, WP_PASSWORD"
        );
    }

    #[test]
    fn test_classification() {
        let limited = ServiceError::RateLimited { service: "gemini" };
        assert!(limited.is_rate_limited());
        assert!(!limited.is_transport());

        let status = ServiceError::Status {
            service: "wordpress",
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "oops".to_string(),
        };
        assert!(!status.is_transport());
        assert_eq!(status.to_string(), "wordpress returned 500 Internal Server Error: oops");
        assert!(!status.is_unreadable_success());

        let decode = ServiceError::decode("wordpress", serde_json::from_str::<u64>("{").unwrap_err());
        assert!(decode.is_unreadable_success());
        assert!(!decode.is_transport());

        let large = ServiceError::TooLarge { size: 11, limit: 10 };
        assert_eq!(large.to_string(), "image is 11 bytes, over the 10 byte limit");
    }
}
