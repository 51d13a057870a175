//! Media Manager: re-host the story image in the destination media library.
//!
//! Best-effort. Any failure is logged and yields `None`; the post is then
//! published without a featured image.

use crate::config::Config;
use crate::errors::ServiceError;
use crate::models::MediaAsset;
use crate::utils::{clean_title, ensure_success};
use crate::wordpress::WordPress;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{info, instrument, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024; // 10MB
const FILENAME_STEM_CHARS: usize = 20;
const SERVICE: &str = "image host";

/// Map a response `Content-Type` onto an upload content type and extension.
/// Anything unrecognised is sent as JPEG.
pub fn image_kind(content_type: Option<&str>) -> (&'static str, &'static str) {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match essence.as_deref() {
        Some("image/png") => ("image/png", "png"),
        Some("image/gif") => ("image/gif", "gif"),
        Some("image/webp") => ("image/webp", "webp"),
        _ => ("image/jpeg", "jpg"),
    }
}

/// Filesystem-safe upload name derived from the story title.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("Mars: Water Found!", "jpg"), "science-mars-water-found.jpg");
/// ```
pub fn sanitize_filename(title: &str, extension: &str) -> String {
    let stem: String = clean_title(title).chars().take(FILENAME_STEM_CHARS).collect();
    format!("science-{}.{}", stem.replace(' ', "-").to_lowercase(), extension)
}

/// Fetch the image, refusing anything over `limit` bytes.
async fn download(
    http: &reqwest::Client,
    image_url: &str,
    limit: u64,
) -> Result<(Vec<u8>, Option<String>), ServiceError> {
    let response = http.get(image_url).timeout(DOWNLOAD_TIMEOUT).send().await?;
    let mut response = ensure_success(SERVICE, response).await?;

    // Check content length before downloading
    if let Some(size) = response.content_length()
        && size > limit
    {
        return Err(ServiceError::TooLarge { size, limit });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Content-Length may be missing or wrong, so count while reading
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| ServiceError::Body { service: SERVICE, source })?
    {
        let size = (bytes.len() + chunk.len()) as u64;
        if size > limit {
            return Err(ServiceError::TooLarge { size, limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok((bytes, content_type))
}

/// Download `image_url` and upload it to the media library.
#[instrument(level = "info", skip(http, config))]
pub async fn upload_image(
    http: &reqwest::Client,
    config: &Config,
    image_url: Option<&str>,
    title: &str,
) -> Option<MediaAsset> {
    let Some(image_url) = image_url.filter(|u| !u.trim().is_empty()) else {
        info!("No image to upload");
        return None;
    };

    let (bytes, content_type) = match download(http, image_url, MAX_IMAGE_BYTES).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            warn!(error = %e, "Image download failed; continuing without image");
            return None;
        }
    };
    if bytes.is_empty() {
        warn!("Image download was empty; continuing without image");
        return None;
    }

    let (upload_type, extension) = image_kind(content_type.as_deref());
    let filename = sanitize_filename(title, extension);

    match WordPress::new(http, config)
        .upload_media(bytes, &filename, upload_type)
        .await
    {
        Ok(media) => {
            let source_url = media.source_url.filter(|u| !u.trim().is_empty());
            match &source_url {
                Some(url) => info!(media_id = media.id, source_url = %url, %filename, "Uploaded image"),
                None => warn!(media_id = media.id, %filename, "Uploaded image has no source_url; featuring it without an embed"),
            }
            Some(MediaAsset {
                id: media.id,
                source_url,
            })
        }
        Err(e) => {
            warn!(error = %e, %filename, "Image upload failed; continuing without image");
            None
        }
    }
}
