//! Fallback identity used when no client-ID match exists.

use serde::Serialize;

use super::item::MediaItem;
use super::payload::MediaData;
use super::types::MediaType;

/// `(normalized title, release year, type, discriminator)`.
///
/// This is a heuristic; distinct works can share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchKey {
    pub title: String,
    pub release_year: Option<i32>,
    pub media_type: MediaType,
    pub discriminator: Option<String>,
}

impl MatchKey {
    /// Derive the key for an item.
    ///
    /// Returns `None` when the title normalizes to nothing, or when neither a
    /// year nor a discriminator is available (unless `require_year` is off).
    pub fn for_item<T: MediaData>(item: &MediaItem<T>, require_year: bool) -> Option<Self> {
        let title = normalize_title(&item.title);
        if title.is_empty() {
            return None;
        }

        let discriminator = item.data.match_discriminator();
        if require_year && item.release_year.is_none() && discriminator.is_none() {
            return None;
        }

        Some(Self {
            title,
            release_year: item.release_year,
            media_type: item.media_type,
            discriminator,
        })
    }
}

/// Lowercase, treat non-alphanumerics as separators, collapse whitespace.
///
/// `"Dune: Part  One"` and `"dune part one"` normalize identically.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
