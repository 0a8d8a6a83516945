//! Anicat Core Library
//!
//! This crate provides an anime catalog client over a JSON:API anime
//! service (Kitsu compatible).
//!
//! # Features
//! - Filtered, paginated search and discovery listings (trending, popular,
//!   seasonal, related, random)
//! - Hydration of every record with its genres, episodes, reviews and
//!   characters, fetched concurrently
//! - Bounded request concurrency, retries with backoff, per-request timeout
//!   and cancellation
//! - Watchlists and personal info with optimistic concurrency control

pub mod catalog;
pub mod client;
pub mod document;
pub mod error;
pub mod hydrate;
pub mod query;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use client::{AnimeClient, ClientConfig, RateLimiter};
pub use error::{AnimeError, Result};
pub use hydrate::Hydrator;
pub use query::{SearchParams, Season, SortOrder};
pub use store::{BlobStore, FileStore, MemoryStore, ProfileStore};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    AgeRating, AnimeRecord, Character, Episode, Genre, HydratedAnime, Hydration, Page,
    PersonalInfo, Relations, Review, Watchlist,
};
