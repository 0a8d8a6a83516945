//! Hydration of base anime records
//!
//! A base record from `/anime` carries no relations. Hydration fetches, per
//! anime, its genres, episodes, reviews and character references
//! concurrently, then the detail record of every referenced character, and
//! merges the results.
//!
//! Failure policy:
//! - any of the four relation fetches failing fails the whole anime
//! - a single character detail failing drops that character only
//! - cancellation always propagates

use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::AnimeClient;
use crate::document::{CharacterRef, Document, ListDocument};
use crate::error::{AnimeError, Result};
use crate::types::{
    AnimeRecord, Character, CharacterAttributes, Episode, Genre, HydratedAnime, Hydration,
    Relations, Resource, Review,
};

/// Fetches and merges the related collections of anime records
///
/// Cheap to clone; clones share the HTTP client and the cancellation token.
#[derive(Clone)]
pub struct Hydrator {
    client: Arc<AnimeClient>,
    cancel: CancellationToken,
}

impl Hydrator {
    pub fn new(client: Arc<AnimeClient>, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    /// Fetch the four relations of one anime.
    ///
    /// Character details are fetched after the character list; those that
    /// fail are left out of `characters` and listed in `missing_characters`,
    /// keeping the relative order of the rest.
    ///
    /// # Errors
    /// - `AnimeError::InvalidId` if `anime_id` is blank
    /// - the first error of the genres, episodes, reviews or characters fetch
    /// - `AnimeError::Cancelled` if the token fires at any point
    pub async fn hydrate_one(&self, anime_id: &str) -> Result<Relations> {
        let id = validate_id(anime_id)?;
        let segment = urlencoding::encode(id);

        let (genres, episodes, reviews, refs) = tokio::try_join!(
            self.list::<Genre>(format!("/anime/{}/genres", segment)),
            self.list::<Episode>(format!("/anime/{}/episodes", segment)),
            self.list::<Review>(format!("/anime/{}/reviews", segment)),
            self.list::<CharacterRef>(format!("/anime/{}/characters", segment)),
        )?;

        let (characters, missing_characters) = self.fetch_characters(id, &refs).await?;

        debug!(
            anime_id = id,
            genres = genres.len(),
            episodes = episodes.len(),
            reviews = reviews.len(),
            characters = characters.len(),
            "hydrated anime"
        );

        Ok(Relations {
            genres,
            episodes,
            reviews,
            characters,
            missing_characters,
        })
    }

    /// Hydrate every record of a batch.
    ///
    /// The output is positionally aligned with the input: entry `i` is the
    /// outcome for `animes[i]`. A failed anime becomes `Hydration::Failed`
    /// carrying its base record and the cause, never an empty record.
    pub async fn hydrate_many(&self, animes: Vec<AnimeRecord>) -> Vec<Hydration> {
        if animes.is_empty() {
            return Vec::new();
        }
        let in_flight = self.client.config().max_concurrent_hydrations;

        stream::iter(animes)
            .map(|anime| async move {
                let outcome = self.hydrate_one(&anime.id).await;
                match outcome {
                    Ok(relations) => Hydration::Hydrated(HydratedAnime::new(anime, relations)),
                    Err(error) => {
                        warn!(anime_id = %anime.id, error = %error, "hydration failed");
                        Hydration::Failed { anime, error }
                    }
                }
            })
            .buffered(in_flight)
            .collect()
            .await
    }

    async fn list<T>(&self, path: String) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let document: ListDocument<T> = self.client.get_json(&path, &[], &self.cancel).await?;
        Ok(document.data)
    }

    async fn fetch_characters(
        &self,
        anime_id: &str,
        refs: &[CharacterRef],
    ) -> Result<(Vec<Character>, Vec<String>)> {
        let fetches = refs.iter().map(|entry| async move {
            let path = format!("/characters/{}", urlencoding::encode(entry.character_id()));
            let result = self
                .client
                .get_json::<Document<Resource<CharacterAttributes>>>(&path, &[], &self.cancel)
                .await;
            (entry, result)
        });

        let mut characters = Vec::with_capacity(refs.len());
        let mut missing = Vec::new();

        for (entry, result) in join_all(fetches).await {
            match result {
                Ok(document) => characters.push(Character::from_record(document.data, entry.role())),
                Err(AnimeError::Cancelled) => return Err(AnimeError::Cancelled),
                Err(error) => {
                    warn!(
                        anime_id,
                        character_id = entry.character_id(),
                        error = %error,
                        "dropping character"
                    );
                    missing.push(entry.character_id().to_string());
                }
            }
        }

        Ok((characters, missing))
    }
}

/// Trimmed, non-empty identifier
pub(crate) fn validate_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AnimeError::InvalidId(id.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnimeAttributes;

    fn hydrator() -> Hydrator {
        Hydrator::new(Arc::new(AnimeClient::new().unwrap()), CancellationToken::new())
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id(" 42 ").unwrap(), "42");
        assert!(matches!(validate_id("   "), Err(AnimeError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_hydrate_one_blank_id() {
        let result = hydrator().hydrate_one("").await;
        assert!(matches!(result, Err(AnimeError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_hydrate_many_empty_input() {
        let result = hydrator().hydrate_many(Vec::new()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_many_marks_invalid_ids_failed() {
        let animes = vec![Resource {
            id: " ".to_string(),
            kind: "anime".to_string(),
            attributes: AnimeAttributes::default(),
        }];
        let result = hydrator().hydrate_many(animes).await;

        assert_eq!(result.len(), 1);
        assert!(matches!(result[0].error(), Some(AnimeError::InvalidId(_))));
    }
}
