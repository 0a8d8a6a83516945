//! Watchlists and personal info
//!
//! Both live as whole JSON blobs (`watchlists`, `personalInfo`). Every
//! mutation reads the blob, applies the change and writes it back with a
//! version check, retrying from a fresh read when another writer won.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AnimeError, Result};
use crate::store::backend::BlobStore;
use crate::types::{AnimeRecord, PersonalInfo, Watchlist};

const WATCHLISTS_KEY: &str = "watchlists";
const PERSONAL_INFO_KEY: &str = "personalInfo";

/// Attempts per mutation before a version conflict is reported
const MAX_UPDATE_ATTEMPTS: u32 = 5;

/// User profile data over a [`BlobStore`]
pub struct ProfileStore<S> {
    backend: S,
}

impl<S: BlobStore> ProfileStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// All watchlists, in creation order
    pub fn watchlists(&self) -> Result<Vec<Watchlist>> {
        Ok(self.read::<Vec<Watchlist>>(WATCHLISTS_KEY)?.1)
    }

    pub fn watchlist(&self, list_id: &str) -> Result<Watchlist> {
        self.watchlists()?
            .into_iter()
            .find(|list| list.id == list_id)
            .ok_or_else(|| AnimeError::WatchlistNotFound(list_id.to_string()))
    }

    /// Create an empty watchlist with a fresh id
    ///
    /// # Errors
    /// `AnimeError::InvalidArgument` if the trimmed name is empty.
    pub fn create_watchlist(&self, name: &str) -> Result<Watchlist> {
        let name = valid_name(name)?;
        let created = Watchlist {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            animes: Vec::new(),
        };

        self.update(WATCHLISTS_KEY, |lists: &mut Vec<Watchlist>| {
            lists.push(created.clone());
            Ok(())
        })?;

        info!(list_id = %created.id, name = %created.name, "created watchlist");
        Ok(created)
    }

    pub fn rename_watchlist(&self, list_id: &str, name: &str) -> Result<Watchlist> {
        let name = valid_name(name)?;
        self.update(WATCHLISTS_KEY, |lists: &mut Vec<Watchlist>| {
            let list = find_mut(lists, list_id)?;
            list.name = name.to_string();
            Ok(list.clone())
        })
    }

    /// Delete a watchlist. Returns whether it existed.
    pub fn remove_watchlist(&self, list_id: &str) -> Result<bool> {
        self.update(WATCHLISTS_KEY, |lists: &mut Vec<Watchlist>| {
            let before = lists.len();
            lists.retain(|list| list.id != list_id);
            Ok(lists.len() != before)
        })
    }

    /// Append an anime to a list. Returns `false` if it was already there.
    pub fn add_anime(&self, list_id: &str, anime: &AnimeRecord) -> Result<bool> {
        let added = self.update(WATCHLISTS_KEY, |lists: &mut Vec<Watchlist>| {
            let list = find_mut(lists, list_id)?;
            if list.contains(&anime.id) {
                return Ok(false);
            }
            list.animes.push(anime.clone());
            Ok(true)
        })?;

        debug!(list_id, anime_id = %anime.id, added, "add anime to watchlist");
        Ok(added)
    }

    /// Remove an anime from a list. Returns whether it was present.
    pub fn remove_anime(&self, list_id: &str, anime_id: &str) -> Result<bool> {
        self.update(WATCHLISTS_KEY, |lists: &mut Vec<Watchlist>| {
            let list = find_mut(lists, list_id)?;
            let before = list.animes.len();
            list.animes.retain(|anime| anime.id != anime_id);
            Ok(list.animes.len() != before)
        })
    }

    /// Stored profile details, empty if never set
    pub fn personal_info(&self) -> Result<PersonalInfo> {
        Ok(self.read::<PersonalInfo>(PERSONAL_INFO_KEY)?.1)
    }

    pub fn set_personal_info(&self, info: PersonalInfo) -> Result<()> {
        self.update(PERSONAL_INFO_KEY, |current: &mut PersonalInfo| {
            *current = info.clone();
            Ok(())
        })
    }

    pub fn set_name(&self, name: &str) -> Result<PersonalInfo> {
        self.update(PERSONAL_INFO_KEY, |current: &mut PersonalInfo| {
            current.name = name.to_string();
            Ok(current.clone())
        })
    }

    pub fn set_avatar(&self, avatar: &str) -> Result<PersonalInfo> {
        self.update(PERSONAL_INFO_KEY, |current: &mut PersonalInfo| {
            current.avatar = avatar.to_string();
            Ok(current.clone())
        })
    }

    fn read<T>(&self, key: &str) -> Result<(u64, T)>
    where
        T: DeserializeOwned + Default,
    {
        match self.backend.get(key)? {
            Some(blob) => {
                let value = serde_json::from_value(blob.value)
                    .map_err(|e| AnimeError::Storage(format!("{}: {}", key, e)))?;
                Ok((blob.version, value))
            }
            None => Ok((0, T::default())),
        }
    }

    /// Read-modify-write with optimistic concurrency
    fn update<T, R, F>(&self, key: &str, mut apply: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnMut(&mut T) -> Result<R>,
    {
        let mut attempt = 1;
        loop {
            let (version, mut value) = self.read::<T>(key)?;
            let outcome = apply(&mut value)?;
            let encoded = serde_json::to_value(&value)?;

            match self.backend.compare_and_swap(key, version, encoded) {
                Ok(_) => return Ok(outcome),
                Err(AnimeError::VersionConflict { .. }) if attempt < MAX_UPDATE_ATTEMPTS => {
                    debug!(key, attempt, "concurrent write detected, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn valid_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AnimeError::InvalidArgument(
            "Watchlist name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn find_mut<'a>(lists: &'a mut [Watchlist], list_id: &str) -> Result<&'a mut Watchlist> {
    lists
        .iter_mut()
        .find(|list| list.id == list_id)
        .ok_or_else(|| AnimeError::WatchlistNotFound(list_id.to_string()))
}
