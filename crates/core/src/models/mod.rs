//! Shared domain models.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Image shown whenever a game has no usable artwork URL.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/250";

/// Category assigned when the remote record carries no genre.
pub const UNKNOWN_CATEGORY: &str = "N/A";

/// External identifier of a catalog entry.
pub type GameId = u64;

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("invalid url regex"));

/// Tag attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Display name of the tag.
    pub name: String,
}

/// One normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Identifier, the only equality key between entries.
    pub id: GameId,
    /// Display name.
    pub name: String,
    /// Short slug carried over from the remote record.
    pub description: Option<String>,
    /// Artwork URL as delivered, possibly malformed.
    pub image_url: Option<String>,
    /// Average user rating.
    pub rating: Option<f64>,
    /// Name of the first genre, or [`UNKNOWN_CATEGORY`].
    pub category: String,
    /// Calendar year of release; `None` when the date was missing or unparseable.
    pub release_year: Option<i32>,
    /// Up to three tags.
    pub tags: Vec<Tag>,
}

impl GameSummary {
    /// Artwork URL when it looks absolute, the placeholder otherwise.
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if ABSOLUTE_URL.is_match(url) => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// Description text with a fallback for empty slugs.
    pub fn description_or_default(&self) -> &str {
        self.description
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or("No description available.")
    }

    /// Comma separated tag names, `N/A` when there are none.
    pub fn tag_line(&self) -> String {
        if self.tags.is_empty() {
            return UNKNOWN_CATEGORY.to_string();
        }
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rating for display; zero and missing ratings both read as `N/A`.
    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(rating) if rating != 0.0 => format!("{rating:.2}"),
            _ => UNKNOWN_CATEGORY.to_string(),
        }
    }

    /// Release year rendered the way the year filter compares it.
    pub fn release_year_label(&self) -> Option<String> {
        self.release_year.map(|year| year.to_string())
    }
}

/// Full record for the single-game view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    /// Identifier shared with the catalog entry.
    pub id: GameId,
    /// Display name.
    pub name: String,
    /// Prose description, if the service has one.
    pub description: Option<String>,
    /// Hero artwork URL.
    pub background_image: Option<String>,
    /// Release date exactly as delivered.
    pub released: Option<String>,
    /// Average user rating.
    pub rating: Option<f64>,
    /// Platform names.
    pub platforms: Vec<String>,
    /// Genre names in service order.
    pub genres: Vec<String>,
}

/// Screenshot belonging to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Screenshot identifier.
    pub id: u64,
    /// Image URL.
    pub image: String,
}

/// Trailer belonging to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    /// Trailer identifier.
    pub id: u64,
    /// Trailer title.
    pub name: String,
    /// Highest quality stream URL.
    pub url: Option<String>,
}
