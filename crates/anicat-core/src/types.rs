//! Data types for the Anicat client
//!
//! Remote records follow the JSON:API resource shape (`id`, `type`,
//! `attributes`). Unknown fields are ignored so that additions on the
//! server side never break decoding. All types implement Serialize for
//! JSON compatibility with Tauri.

use serde::{Deserialize, Serialize};

use crate::error::{AnimeError, Result};

/// A JSON:API resource with kind-specific attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    /// Opaque identifier, unique per resource type
    pub id: String,
    /// Resource type as reported by the API (e.g. "anime", "genres")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Kind-specific attributes
    pub attributes: A,
}

/// Base anime record as returned by `/anime`
pub type AnimeRecord = Resource<AnimeAttributes>;
/// Genre (category) record
pub type Genre = Resource<GenreAttributes>;
/// Age rating record
pub type AgeRating = Resource<AgeRatingAttributes>;
/// Episode record
pub type Episode = Resource<EpisodeAttributes>;
/// User review record
pub type Review = Resource<ReviewAttributes>;

/// Localized titles of an anime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Titles {
    pub en: Option<String>,
    pub en_jp: Option<String>,
    pub ja_jp: Option<String>,
}

/// Image variants served by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSet {
    pub tiny: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
    pub original: Option<String>,
}

impl ImageSet {
    /// Largest available variant
    pub fn best(&self) -> Option<&str> {
        self.original
            .as_deref()
            .or(self.large.as_deref())
            .or(self.medium.as_deref())
            .or(self.small.as_deref())
            .or(self.tiny.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimeAttributes {
    pub canonical_title: Option<String>,
    pub titles: Titles,
    pub synopsis: Option<String>,
    pub cover_image: Option<ImageSet>,
    pub poster_image: Option<ImageSet>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub episode_count: Option<u32>,
    /// Average rating on a 0-100 scale, served as a decimal string
    pub average_rating: Option<String>,
    pub rating_rank: Option<u32>,
    pub popularity_rank: Option<u32>,
    pub age_rating: Option<String>,
    pub age_rating_guide: Option<String>,
    /// YouTube video id of the trailer
    pub youtube_video_id: Option<String>,
}

impl AnimeAttributes {
    /// Parsed average rating, if the API provided a numeric one
    pub fn average_rating(&self) -> Option<f32> {
        self.average_rating.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreAttributes {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeRatingAttributes {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EpisodeAttributes {
    pub titles: Titles,
    pub canonical_title: Option<String>,
    pub thumbnail: Option<ImageSet>,
    /// Episode number (1-based)
    pub number: Option<u32>,
    pub airdate: Option<String>,
    pub synopsis: Option<String>,
    /// Length in minutes
    pub length: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewAttributes {
    pub content: Option<String>,
    pub rating: Option<f32>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterAttributes {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageSet>,
}

/// Character detail merged with the role it plays in one anime
///
/// The role comes from the anime-character join entry, not from the
/// character record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub attributes: CharacterAttributes,
    #[serde(default)]
    pub role: String,
}

impl Character {
    /// Attach a role to a fetched character record
    pub fn from_record(record: Resource<CharacterAttributes>, role: String) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            attributes: record.attributes,
            role,
        }
    }
}

/// Related collections attached to one anime by hydration
///
/// An empty sequence here always means the API reported zero items;
/// failed relation fetches never produce a `Relations` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    pub genres: Vec<Genre>,
    pub episodes: Vec<Episode>,
    pub reviews: Vec<Review>,
    pub characters: Vec<Character>,
    /// Character ids whose detail fetch failed and were left out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_characters: Vec<String>,
}

/// Anime record together with its related collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedAnime {
    #[serde(flatten)]
    pub anime: AnimeRecord,
    #[serde(flatten)]
    pub relations: Relations,
}

impl HydratedAnime {
    pub fn new(anime: AnimeRecord, relations: Relations) -> Self {
        Self { anime, relations }
    }

    pub fn id(&self) -> &str {
        &self.anime.id
    }

    /// Genre names, in the order the API returned them
    pub fn genre_names(&self) -> Vec<String> {
        self.relations
            .genres
            .iter()
            .map(|g| g.attributes.name.clone())
            .collect()
    }
}

/// Outcome of hydrating one anime inside a batch
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Hydration {
    /// All four relations fetched
    Hydrated(HydratedAnime),
    /// A relation fetch failed; the base record is kept for the caller
    Failed {
        anime: AnimeRecord,
        error: AnimeError,
    },
}

impl Hydration {
    /// Identifier of the base record, whatever the outcome
    pub fn id(&self) -> &str {
        match self {
            Hydration::Hydrated(hydrated) => hydrated.id(),
            Hydration::Failed { anime, .. } => &anime.id,
        }
    }

    pub fn is_hydrated(&self) -> bool {
        matches!(self, Hydration::Hydrated(_))
    }

    pub fn hydrated(&self) -> Option<&HydratedAnime> {
        match self {
            Hydration::Hydrated(hydrated) => Some(hydrated),
            Hydration::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AnimeError> {
        match self {
            Hydration::Hydrated(_) => None,
            Hydration::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<HydratedAnime> {
        match self {
            Hydration::Hydrated(hydrated) => Ok(hydrated),
            Hydration::Failed { error, .. } => Err(error),
        }
    }

    /// Fall back to the base record with empty relations on failure.
    ///
    /// Loses the distinction between "no items" and "fetch failed"; use only
    /// where a caller prefers showing the bare record to showing an error.
    pub fn degrade(self) -> HydratedAnime {
        match self {
            Hydration::Hydrated(hydrated) => hydrated,
            Hydration::Failed { anime, .. } => HydratedAnime::new(anime, Relations::default()),
        }
    }
}

/// Paginated result wrapper for search results
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on the current page
    pub items: Vec<T>,
    /// Current page number (1-based)
    pub current_page: u32,
    /// Requested page size
    pub page_size: u32,
    /// Total number of matches across all pages
    pub total_count: u64,
    /// Whether there are more pages available
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, current_page: u32, page_size: u32, total_count: u64) -> Self {
        let seen = u64::from(current_page) * u64::from(page_size);
        Self {
            items,
            current_page,
            page_size,
            total_count,
            has_next_page: seen < total_count,
        }
    }

    /// Create an empty result for the first page
    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), 1, page_size, 0)
    }
}

/// Stored profile details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    /// Avatar image, usually a data URL
    pub avatar: String,
}

/// A named, user-curated list of anime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: String,
    pub name: String,
    pub animes: Vec<AnimeRecord>,
}

impl Watchlist {
    pub fn contains(&self, anime_id: &str) -> bool {
        self.animes.iter().any(|anime| anime.id == anime_id)
    }
}
