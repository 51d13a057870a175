//! Ordered fallback over a list of models.
//!
//! Each model is tried in declared order. A rate limit moves on at once with
//! no delay, any other failure is logged and moves on, and the first success
//! ends the cascade; later models are never contacted.

use crate::errors::ServiceError;
use std::future::Future;
use tracing::{error, info, warn};

/// Run `attempt` for each model until one succeeds. Returns the winning model
/// and its value, or `None` once the list is exhausted.
pub async fn first_success<'m, T, F, Fut>(models: &'m [String], mut attempt: F) -> Option<(&'m str, T)>
where
    F: FnMut(&'m str) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    for (index, model) in models.iter().enumerate() {
        let model = model.as_str();
        info!(%model, position = index + 1, of = models.len(), "Trying model");
        match attempt(model).await {
            Ok(value) => return Some((model, value)),
            Err(e) if e.is_rate_limited() => {
                warn!(%model, "Rate limited; advancing to next model");
            }
            Err(e) => {
                error!(%model, error = %e, "Model failed; advancing to next model");
            }
        }
    }
    error!(tried = models.len(), "Every model in the cascade failed");
    None
}

/// Keep the declared order but drop models the service does not list.
/// An empty intersection falls back to the declared list unchanged.
pub fn narrow_to_available(declared: &[String], available: &[String]) -> Vec<String> {
    let narrowed: Vec<String> = declared
        .iter()
        .filter(|m| available.iter().any(|a| a == *m))
        .cloned()
        .collect();
    if narrowed.is_empty() {
        declared.to_vec()
    } else {
        narrowed
    }
}
