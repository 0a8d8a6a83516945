//! Request shaping for the `/anime` collection endpoint
//!
//! Turns typed search/listing parameters into the JSON:API query pairs the
//! remote service understands (`page[limit]`, `filter[text]`, `sort`, ...).
//! Filters that carry no value are omitted entirely, never sent empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnimeError, Result};

/// Largest page the remote API serves for `/anime`
pub const MAX_PAGE_LIMIT: u32 = 20;

/// Default page size for searches
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Broadcast season of the year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = AnimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            other => Err(AnimeError::InvalidArgument(format!(
                "Invalid season '{}'. Must be one of: winter, spring, summer, fall",
                other
            ))),
        }
    }
}

/// Server-side ranking used for listing endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    RatingRank,
    PopularityRank,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::RatingRank => "ratingRank",
            SortOrder::PopularityRank => "popularityRank",
        }
    }
}

/// Filtered, paginated search request
///
/// Every filter is optional. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
    pub limit: u32,
    pub page: u32,
    pub text: Option<String>,
    /// Genre slugs; all must match
    pub genres: Vec<String>,
    pub season_year: Option<u32>,
    pub age_rating: Option<String>,
    /// Lower bound on average rating (0-100)
    pub min_score: Option<f32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            page: 1,
            text: None,
            genres: Vec::new(),
            season_year: None,
            age_rating: None,
            min_score: None,
        }
    }
}

impl SearchParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_season_year(mut self, year: u32) -> Self {
        self.season_year = Some(year);
        self
    }

    pub fn with_age_rating(mut self, rating: impl Into<String>) -> Self {
        self.age_rating = Some(rating.into());
        self
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    /// Page size actually sent, after clamping to [`MAX_PAGE_LIMIT`]
    pub fn effective_limit(&self) -> u32 {
        self.limit.min(MAX_PAGE_LIMIT)
    }

    /// Remote offset for the requested page: `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.effective_limit())
    }

    /// Validate and convert into query pairs
    ///
    /// # Errors
    /// `AnimeError::InvalidArgument` if page or limit is zero, or if the
    /// minimum score is negative or not finite.
    pub fn to_query(&self) -> Result<AnimeQuery> {
        if self.page == 0 {
            return Err(AnimeError::InvalidArgument(
                "Page numbers start at 1".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(AnimeError::InvalidArgument(
                "Page size must be at least 1".to_string(),
            ));
        }

        let mut query = AnimeQuery::new()
            .limit(self.effective_limit())
            .offset(self.offset());

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter("text", text);
        }
        query = query.genres(&self.genres);
        if let Some(year) = self.season_year {
            query = query.filter("seasonYear", year);
        }
        if let Some(rating) = self.age_rating.as_deref().filter(|r| !r.is_empty()) {
            query = query.filter("ageRating", rating);
        }
        if let Some(score) = self.min_score {
            if !score.is_finite() || score < 0.0 {
                return Err(AnimeError::InvalidArgument(format!(
                    "Minimum score must be a non-negative number, got {}",
                    score
                )));
            }
            if score > 0.0 {
                query = query.filter("averageRating", format!("{}..", score));
            }
        }

        Ok(query)
    }
}

/// Remote offset for a 1-based page of the given size
pub fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}

/// Ordered list of query pairs for `/anime`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimeQuery {
    pairs: Vec<(String, String)>,
}

impl AnimeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(self, limit: u32) -> Self {
        self.param("page[limit]", limit)
    }

    pub fn offset(self, offset: u64) -> Self {
        self.param("page[offset]", offset)
    }

    pub fn sort(self, order: SortOrder) -> Self {
        self.param("sort", order.as_str())
    }

    pub fn season(self, season: Season, year: u32) -> Self {
        self.filter("season", season).filter("seasonYear", year)
    }

    pub fn filter(self, name: &str, value: impl ToString) -> Self {
        self.param(&format!("filter[{}]", name), value)
    }

    /// Comma-joined genre filter; omitted when no genre is given
    pub fn genres<S: AsRef<str>>(self, genres: &[S]) -> Self {
        let joined = genres
            .iter()
            .map(|g| g.as_ref().trim())
            .filter(|g| !g.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            self
        } else {
            self.filter("genres", joined)
        }
    }

    /// Restrict returned attributes (JSON:API sparse fieldsets)
    pub fn fields(self, kind: &str, fields: &str) -> Self {
        self.param(&format!("fields[{}]", kind), fields)
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}
