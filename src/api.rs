//! Generative-language API interaction.
//!
//! The module uses a trait-based design so the author's model cascade can be
//! driven by the real service or by a scripted fake in tests:
//! - [`TextGenerator`]: core trait, one prompt against one model
//! - [`GeminiClient`]: `generateContent` over HTTP, plus model discovery
//!
//! # Response classification
//!
//! | Response | Result |
//! |----------|--------|
//! | HTTP 429, or error `code: 429` / `status: RESOURCE_EXHAUSTED` | [`ServiceError::RateLimited`] |
//! | any other structured `error` object | [`ServiceError::Api`] |
//! | other non-2xx | [`ServiceError::Status`] |
//! | 2xx without candidate text | [`ServiceError::EmptyResponse`] |
//! | network failure / timeout before a status line | [`ServiceError::Transport`] |
//! | body that breaks off after the status line | [`ServiceError::Body`] |

use crate::config::Config;
use crate::errors::ServiceError;
use crate::utils::{decode_json, ensure_success, truncate_for_log};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const SERVICE: &str = "gemini";
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const LIST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;

/// A system instruction paired with the per-article request.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Trait for async text generation against a named model.
pub trait TextGenerator {
    /// Send the prompt to `model` and return the generated text.
    async fn generate(&self, model: &str, prompt: &Prompt) -> Result<String, ServiceError>;
}

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Client for the Gemini REST API.
#[derive(Debug)]
pub struct GeminiClient<'a> {
    http: &'a reqwest::Client,
    config: &'a Config,
}

impl<'a> GeminiClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a Config) -> Self {
        Self { http, config }
    }

    /// Models currently offered for `generateContent`, without the
    /// `models/` prefix.
    #[instrument(level = "info", skip_all)]
    pub async fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        let response = self
            .http
            .get(self.config.llm_endpoint("models"))
            .query(&[("key", self.config.llm_api_key.as_str()), ("pageSize", "1000")])
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;
        let list: ModelList = decode_json(SERVICE, ensure_success(SERVICE, response).await?).await?;
        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

fn is_exhausted(error: &ApiError) -> bool {
    error.code == Some(429) || error.status.as_deref() == Some("RESOURCE_EXHAUSTED")
}

/// Classify a raw response. Split out from the HTTP call so it can be tested
/// without a server.
fn interpret(status: StatusCode, body: &str) -> Result<String, ServiceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ServiceError::RateLimited { service: SERVICE });
    }

    let parsed = serde_json::from_str::<GenerateResponse>(body);
    if let Ok(GenerateResponse {
        error: Some(error), ..
    }) = &parsed
    {
        if is_exhausted(error) {
            return Err(ServiceError::RateLimited { service: SERVICE });
        }
        return Err(ServiceError::Api {
            service: SERVICE,
            message: format!(
                "{}: {}",
                error.status.as_deref().unwrap_or("ERROR"),
                error.message
            ),
        });
    }

    if !status.is_success() {
        return Err(ServiceError::Status {
            service: SERVICE,
            status,
            body: truncate_for_log(body, 500),
        });
    }

    let response = parsed.map_err(|e| ServiceError::decode(SERVICE, e))?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ServiceError::EmptyResponse { service: SERVICE });
    }
    Ok(text)
}

impl<'a> TextGenerator for GeminiClient<'a> {
    #[instrument(level = "info", skip(self, prompt))]
    async fn generate(&self, model: &str, prompt: &Prompt) -> Result<String, ServiceError> {
        let t0 = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}\n\n{}", prompt.system, prompt.user),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .http
            .post(self.config.llm_endpoint(&format!("models/{model}:generateContent")))
            .query(&[("key", self.config.llm_api_key.as_str())])
            .json(&request)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await;

        let res = match response {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => interpret(status, &body),
                    Err(source) => Err(ServiceError::Body { service: SERVICE, source }),
                }
            }
            Err(e) => Err(ServiceError::Transport(e)),
        };

        let dt = t0.elapsed();
        match &res {
            Ok(text) => debug!(elapsed_ms = dt.as_millis() as u64, chars = text.len(), "Generation returned"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Generation failed"),
        }
        res
    }
}
