//! Wire records returned by the catalog service and their normalization.

use chrono::{DateTime, Datelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::{GameDetail, GameId, GameSummary, Screenshot, Tag, Trailer, UNKNOWN_CATEGORY};

/// Maximum number of tags kept on a summary.
pub const MAX_TAGS: usize = 3;

/// Paged listing envelope.
#[derive(Debug, Deserialize)]
pub struct CatalogPage {
    /// Total number of records the service knows about.
    #[serde(default)]
    pub count: Option<u64>,
    /// Games on this page, in service order.
    pub results: Vec<RemoteGame>,
}

/// Envelope used by the screenshot and trailer sub-resources.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResultList<T> {
    /// Entries, empty when the field is missing or null.
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub results: Vec<T>,
}

/// Reference to a named entity such as a genre or platform.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// One game in the paged listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteGame {
    /// Service identifier.
    pub id: GameId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Artwork URL.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Average rating.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Genres in service order.
    #[serde(default)]
    pub genres: Option<Vec<NamedRef>>,
    /// Release date, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub released: Option<String>,
    /// Tags in service order.
    #[serde(default)]
    pub tags: Option<Vec<NamedRef>>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlatformEntry {
    platform: NamedRef,
}

/// Full record for a single game.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteGameDetail {
    id: GameId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description_raw: Option<String>,
    #[serde(default)]
    background_image: Option<String>,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    platforms: Option<Vec<PlatformEntry>>,
    #[serde(default)]
    genres: Option<Vec<NamedRef>>,
}

/// Screenshot sub-resource entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteScreenshot {
    id: u64,
    #[serde(default)]
    image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MovieData {
    #[serde(default)]
    max: Option<String>,
    #[serde(default, rename = "480")]
    low: Option<String>,
}

/// Trailer sub-resource entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMovie {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: Option<MovieData>,
}

/// Map a listing record onto the internal summary shape.
pub fn normalize(record: RemoteGame) -> GameSummary {
    let category = record
        .genres
        .as_ref()
        .and_then(|genres| genres.first())
        .map(|genre| genre.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
    let release_year = record.released.as_deref().and_then(parse_release_year);
    let tags = record
        .tags
        .unwrap_or_default()
        .into_iter()
        .take(MAX_TAGS)
        .map(|tag| Tag { name: tag.name })
        .collect();

    GameSummary {
        id: record.id,
        name: record.name,
        description: record.slug,
        image_url: record.background_image,
        rating: record.rating,
        category,
        release_year,
        tags,
    }
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("invalid date regex")
});

/// Extract the calendar year from a release date.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and RFC 3339 timestamps. Month
/// must be 1..=12 and day 1..=31; a day past the end of its month still
/// yields the leading year, as it rolls over within the same year.
pub fn parse_release_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(caps) = DATE_SHAPE.captures(raw) {
        let month_ok = caps.get(2).map_or(true, |m| field_in_range(m.as_str(), 12));
        let day_ok = caps.get(3).map_or(true, |m| field_in_range(m.as_str(), 31));
        if !(month_ok && day_ok) {
            return None;
        }
        return caps[1].parse().ok();
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|stamp| stamp.year())
}

fn field_in_range(digits: &str, max: u32) -> bool {
    digits
        .parse::<u32>()
        .map_or(false, |value| (1..=max).contains(&value))
}

impl From<RemoteGameDetail> for GameDetail {
    fn from(record: RemoteGameDetail) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description_raw.filter(|text| !text.trim().is_empty()),
            background_image: record.background_image,
            released: record.released,
            rating: record.rating,
            platforms: record
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| entry.platform.name)
                .collect(),
            genres: record
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|genre| genre.name)
                .collect(),
        }
    }
}

impl From<RemoteScreenshot> for Screenshot {
    fn from(record: RemoteScreenshot) -> Self {
        Self {
            id: record.id,
            image: record.image,
        }
    }
}

impl From<RemoteMovie> for Trailer {
    fn from(record: RemoteMovie) -> Self {
        let data = record.data.unwrap_or_default();
        Self {
            id: record.id,
            name: record.name,
            url: data.max.or(data.low),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
