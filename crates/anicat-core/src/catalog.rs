//! Main catalog API
//!
//! This module provides the high-level API over the remote anime service.
//! Every listing operation follows the same shape: fetch a base collection
//! from `/anime`, then hydrate it with [`Hydrator::hydrate_many`].

use std::sync::Arc;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{AnimeClient, ClientConfig};
use crate::document::{Document, ListDocument};
use crate::error::{AnimeError, Result};
use crate::hydrate::{validate_id, Hydrator};
use crate::query::{AnimeQuery, SearchParams, Season, SortOrder};
use crate::types::{AgeRating, AnimeRecord, Genre, HydratedAnime, Hydration, Page, Relations};

/// Page size of the trending list
pub const TRENDING_LIMIT: u32 = 10;
/// Page size of the popular list
pub const POPULAR_LIMIT: u32 = 20;
/// Page size of seasonal listings
pub const SEASONAL_LIMIT: u32 = 20;

/// Main catalog API
///
/// Provides search, discovery listings, details and random picks, all
/// returning hydrated records. All operations are asynchronous and
/// stateless; the only shared state is the HTTP client.
///
/// # Example
/// ```no_run
/// use anicat_core::{Catalog, SearchParams};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = Catalog::new()?;
///
///     let page = catalog.search(&SearchParams::text("Cowboy Bebop")).await?;
///     println!("Found {} results", page.total_count);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Catalog {
    client: Arc<AnimeClient>,
    hydrator: Hydrator,
    cancel: CancellationToken,
}

impl Catalog {
    /// Create a new catalog with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(AnimeClient::new()?))
    }

    /// Create a catalog configured from `ANICAT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::with_client(AnimeClient::with_config(config)?))
    }

    /// Create a new catalog with a custom client.
    ///
    /// This is useful for testing or when you need custom client configuration.
    pub fn with_client(client: AnimeClient) -> Self {
        Self::from_parts(Arc::new(client), CancellationToken::new())
    }

    fn from_parts(client: Arc<AnimeClient>, cancel: CancellationToken) -> Self {
        let hydrator = Hydrator::new(client.clone(), cancel.clone());
        Self {
            client,
            hydrator,
            cancel,
        }
    }

    /// Catalog sharing this one's client but governed by another token.
    ///
    /// Cancelling `cancel` aborts every request issued through the returned
    /// catalog, and nothing else.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self::from_parts(self.client.clone(), cancel)
    }

    /// Catalog whose token is a child of this one's: cancelled with it, or
    /// on its own.
    pub fn scoped(&self) -> Self {
        self.with_cancellation(self.cancel.child_token())
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Abort all in-flight and future requests of this catalog
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn client(&self) -> &AnimeClient {
        &self.client
    }

    pub fn hydrator(&self) -> &Hydrator {
        &self.hydrator
    }

    /// See [`Hydrator::hydrate_one`]
    pub async fn hydrate_one(&self, anime_id: &str) -> Result<Relations> {
        self.hydrator.hydrate_one(anime_id).await
    }

    /// See [`Hydrator::hydrate_many`]
    pub async fn hydrate_many(&self, animes: Vec<AnimeRecord>) -> Vec<Hydration> {
        self.hydrator.hydrate_many(animes).await
    }

    /// Filtered, paginated search.
    ///
    /// # Returns
    /// * `Ok(Page<Hydration>)` with the hydrated page and the total match count
    /// * `Err(AnimeError::InvalidArgument)` if page or page size is zero
    ///
    /// # Example
    /// ```no_run
    /// use anicat_core::{Catalog, SearchParams};
    ///
    /// # async fn example() -> Result<(), anicat_core::AnimeError> {
    /// let catalog = Catalog::new()?;
    /// let params = SearchParams::text("mecha").with_page(2).with_min_score(70.0);
    /// let page = catalog.search(&params).await?;
    /// for entry in &page.items {
    ///     println!("{} hydrated: {}", entry.id(), entry.is_hydrated());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, params: &SearchParams) -> Result<Page<Hydration>> {
        let query = params.to_query()?;
        let document = self.fetch_anime(&query).await?;

        let returned = document.data.len() as u64;
        let total = document.count().unwrap_or(params.offset() + returned);
        let items = self.hydrator.hydrate_many(document.data).await;

        info!(
            text = params.text.as_deref().unwrap_or(""),
            page = params.page,
            returned,
            total,
            "search completed"
        );

        Ok(Page::new(items, params.page, params.effective_limit(), total))
    }

    /// Highest rated anime
    pub async fn trending(&self) -> Result<Vec<Hydration>> {
        let query = AnimeQuery::new()
            .sort(SortOrder::RatingRank)
            .limit(TRENDING_LIMIT);
        self.list(&query).await
    }

    /// Most popular anime
    pub async fn popular(&self) -> Result<Vec<Hydration>> {
        let query = AnimeQuery::new()
            .sort(SortOrder::PopularityRank)
            .limit(POPULAR_LIMIT);
        self.list(&query).await
    }

    /// Anime that aired in a given season
    pub async fn seasonal(&self, season: Season, year: u32) -> Result<Vec<Hydration>> {
        let query = AnimeQuery::new().season(season, year).limit(SEASONAL_LIMIT);
        self.list(&query).await
    }

    /// Anime sharing the given genres, without `exclude_id`.
    ///
    /// An empty genre list returns an empty result without a request: an
    /// unfiltered listing would not be related to anything.
    pub async fn related<S: AsRef<str>>(
        &self,
        genres: &[S],
        exclude_id: &str,
    ) -> Result<Vec<Hydration>> {
        let query = AnimeQuery::new().genres(genres);
        if query.get("filter[genres]").is_none() {
            debug!("related lookup without genres, skipping request");
            return Ok(Vec::new());
        }

        let document = self.fetch_anime(&query).await?;
        let animes: Vec<AnimeRecord> = document
            .data
            .into_iter()
            .filter(|anime| anime.id != exclude_id)
            .collect();

        Ok(self.hydrator.hydrate_many(animes).await)
    }

    /// Single anime with all its relations.
    ///
    /// # Returns
    /// * `Ok(HydratedAnime)` when the record and all four relations load
    /// * `Err(AnimeError::InvalidId)` if `anime_id` is blank
    /// * `Err(AnimeError::NotFound)` if the anime doesn't exist
    pub async fn details(&self, anime_id: &str) -> Result<HydratedAnime> {
        let id = validate_id(anime_id)?;
        let path = format!("/anime/{}", urlencoding::encode(id));
        let document: Document<AnimeRecord> =
            self.client.get_json(&path, &[], &self.cancel).await?;

        let relations = self.hydrator.hydrate_one(&document.data.id).await?;
        Ok(HydratedAnime::new(document.data, relations))
    }

    /// Uniformly random anime from the whole catalog.
    ///
    /// Reads the total count first, then fetches the one record at a random
    /// offset in `[0, count)`.
    ///
    /// # Errors
    /// - the count fetch failing, unchanged
    /// - `AnimeError::NotFound` if the catalog is empty
    pub async fn random(&self) -> Result<HydratedAnime> {
        let count = self.total_count().await?;
        let offset = random_offset(&mut rand::thread_rng(), count)
            .ok_or_else(|| AnimeError::NotFound("anime catalog is empty".to_string()))?;
        debug!(count, offset, "picked random anime");

        let query = AnimeQuery::new().limit(1).offset(offset);
        let anime = self
            .fetch_anime(&query)
            .await?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AnimeError::NotFound(format!("no anime at offset {}", offset)))?;

        let relations = self.hydrator.hydrate_one(&anime.id).await?;
        Ok(HydratedAnime::new(anime, relations))
    }

    /// Number of anime in the catalog
    pub async fn total_count(&self) -> Result<u64> {
        let query = AnimeQuery::new().fields("anime", "id").limit(1);
        self.fetch_anime(&query).await?.count().ok_or_else(|| {
            AnimeError::InvalidResponse("anime listing carries no meta.count".to_string())
        })
    }

    /// All genres known to the catalog
    pub async fn genres(&self) -> Result<Vec<Genre>> {
        let document: ListDocument<Genre> =
            self.client.get_json("/genres", &[], &self.cancel).await?;
        Ok(document.data)
    }

    /// All age ratings known to the catalog
    pub async fn age_ratings(&self) -> Result<Vec<AgeRating>> {
        let document: ListDocument<AgeRating> =
            self.client.get_json("/age-ratings", &[], &self.cancel).await?;
        Ok(document.data)
    }

    async fn list(&self, query: &AnimeQuery) -> Result<Vec<Hydration>> {
        let document = self.fetch_anime(query).await?;
        Ok(self.hydrator.hydrate_many(document.data).await)
    }

    async fn fetch_anime(&self, query: &AnimeQuery) -> Result<ListDocument<AnimeRecord>> {
        self.client
            .get_json("/anime", query.pairs(), &self.cancel)
            .await
    }
}

/// Uniform offset in `[0, count)`, or `None` for an empty catalog
pub fn random_offset<R: Rng + ?Sized>(rng: &mut R, count: u64) -> Option<u64> {
    (count > 0).then(|| rng.gen_range(0..count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        assert!(catalog.is_ok());
    }

    #[test]
    fn test_random_offset_empty_catalog() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_offset(&mut rng, 0), None);
    }

    #[test]
    fn test_random_offset_single_entry() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(random_offset(&mut rng, 1), Some(0));
        }
    }

    #[test]
    fn test_random_offset_covers_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let offset = random_offset(&mut rng, 5).unwrap();
            seen[offset as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_scoped_catalog_follows_parent() {
        let catalog = Catalog::new().unwrap();
        let scoped = catalog.scoped();
        assert!(!scoped.cancellation_token().is_cancelled());

        catalog.cancel();
        assert!(scoped.cancellation_token().is_cancelled());
    }

    #[test]
    fn test_with_cancellation_is_independent() {
        let catalog = Catalog::new().unwrap();
        let other = catalog.with_cancellation(CancellationToken::new());

        other.cancel();
        assert!(!catalog.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_details_blank_id() {
        let catalog = Catalog::new().unwrap();
        let result = catalog.details("  ").await;
        assert!(matches!(result, Err(AnimeError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_search_page_zero() {
        let catalog = Catalog::new().unwrap();
        let result = catalog.search(&SearchParams::default().with_page(0)).await;
        assert!(matches!(result, Err(AnimeError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_related_without_genres() {
        let catalog = Catalog::new().unwrap();
        let result = catalog.related::<String>(&[], "1").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_catalog_fails_fast() {
        let catalog = Catalog::new().unwrap();
        catalog.cancel();
        let result = catalog.trending().await;
        assert!(matches!(result, Err(AnimeError::Cancelled)));
    }

    proptest! {
        #[test]
        fn prop_random_offset_in_range(seed in any::<u64>(), count in 1u64..1_000_000) {
            let mut rng = StdRng::seed_from_u64(seed);
            let offset = random_offset(&mut rng, count).unwrap();
            prop_assert!(offset < count);
        }
    }
}
