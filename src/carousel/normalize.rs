use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use vitrine_api_types::AdImage;

/// An ad image that is safe to render: enabled, with an https URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedImage {
    pub url: String,
    pub link: Option<String>,
    pub alt: String,
}

/// Decode raw cache items into ad images. Items that are not ad objects are
/// dropped; a missing ad image is cosmetic.
pub fn decode_ad_images(items: &[Value]) -> Vec<AdImage> {
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item.clone()) {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(position, error = %err, "Skipping undecodable ad item");
                None
            }
        })
        .collect()
}

/// Drop disabled or urlless images and upgrade `http://` URLs to `https://`.
pub fn normalize_images(raw: &[AdImage]) -> Vec<NormalizedImage> {
    raw.iter()
        .filter(|image| !image.disabled)
        .filter_map(|image| {
            let url = image.image_url.as_deref().map(str::trim)?;
            if url.is_empty() {
                return None;
            }
            Some(NormalizedImage {
                url: secure_url(url),
                link: image
                    .link
                    .as_deref()
                    .map(str::trim)
                    .filter(|link| !link.is_empty())
                    .map(secure_url),
                alt: image.alt.clone().unwrap_or_default(),
            })
        })
        .collect()
}

pub fn secure_url(url: &str) -> String {
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
        _ => url.to_string(),
    }
}
