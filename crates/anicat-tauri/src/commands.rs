//! Tauri commands for Anicat
//!
//! This module contains all Tauri commands that can be invoked from the frontend.

use std::str::FromStr;
use std::sync::Arc;

use tauri::State;

use crate::{error_message, CatalogState};
use anicat_core::{
    AgeRating, AnimeError, AnimeRecord, FileStore, Genre, HydratedAnime, Hydration, Page,
    PersonalInfo, ProfileStore, SearchParams, Season, Watchlist,
};

/// Search the catalog with filters and pagination.
///
/// # Arguments
/// * `params` - Text, genres, season year, age rating, minimum score, page and limit
///
/// # Returns
/// * `Ok(Page<Hydration>)` where each entry is hydrated or carries its failure
/// * `Err(String)` with error message if the listing itself fails
#[tauri::command]
pub async fn search_anime(
    state: State<'_, CatalogState>,
    params: SearchParams,
) -> Result<Page<Hydration>, String> {
    state.catalog().search(&params).await.map_err(error_message)
}

/// Top rated anime.
#[tauri::command]
pub async fn trending_anime(state: State<'_, CatalogState>) -> Result<Vec<Hydration>, String> {
    state.catalog().trending().await.map_err(error_message)
}

/// Most popular anime.
#[tauri::command]
pub async fn popular_anime(state: State<'_, CatalogState>) -> Result<Vec<Hydration>, String> {
    state.catalog().popular().await.map_err(error_message)
}

/// Anime airing in a given season.
///
/// # Arguments
/// * `season` - `winter`, `spring`, `summer` or `fall` (case-insensitive)
/// * `year` - Season year
#[tauri::command]
pub async fn seasonal_anime(
    state: State<'_, CatalogState>,
    season: String,
    year: u32,
) -> Result<Vec<Hydration>, String> {
    let season = parse_season(&season)?;
    state
        .catalog()
        .seasonal(season, year)
        .await
        .map_err(error_message)
}

/// Anime sharing the given genres, without the anime they were found for.
///
/// # Arguments
/// * `genres` - Genre names of the source anime
/// * `exclude_id` - Id of the source anime
#[tauri::command]
pub async fn related_anime(
    state: State<'_, CatalogState>,
    genres: Vec<String>,
    exclude_id: String,
) -> Result<Vec<Hydration>, String> {
    state
        .catalog()
        .related(genres.as_slice(), &exclude_id)
        .await
        .map_err(error_message)
}

/// Full details of one anime.
///
/// # Returns
/// * `Ok(HydratedAnime)` with genres, episodes, reviews and characters
/// * `Err(String)` if the anime or any of its relations cannot be loaded
#[tauri::command]
pub async fn anime_details(
    state: State<'_, CatalogState>,
    anime_id: String,
) -> Result<HydratedAnime, String> {
    state
        .catalog()
        .details(&anime_id)
        .await
        .map_err(error_message)
}

/// One anime picked uniformly at random.
#[tauri::command]
pub async fn random_anime(state: State<'_, CatalogState>) -> Result<HydratedAnime, String> {
    state.catalog().random().await.map_err(error_message)
}

#[tauri::command]
pub async fn list_genres(state: State<'_, CatalogState>) -> Result<Vec<Genre>, String> {
    state.catalog().genres().await.map_err(error_message)
}

#[tauri::command]
pub async fn list_age_ratings(state: State<'_, CatalogState>) -> Result<Vec<AgeRating>, String> {
    state.catalog().age_ratings().await.map_err(error_message)
}

#[tauri::command]
pub async fn list_watchlists(state: State<'_, CatalogState>) -> Result<Vec<Watchlist>, String> {
    with_profile(&state, |profile| profile.watchlists()).await
}

/// Create an empty watchlist.
///
/// # Returns
/// * `Ok(Watchlist)` with its generated id
/// * `Err(String)` if the name is blank or the store cannot be written
#[tauri::command]
pub async fn create_watchlist(
    state: State<'_, CatalogState>,
    name: String,
) -> Result<Watchlist, String> {
    with_profile(&state, move |profile| profile.create_watchlist(&name)).await
}

#[tauri::command]
pub async fn rename_watchlist(
    state: State<'_, CatalogState>,
    list_id: String,
    name: String,
) -> Result<Watchlist, String> {
    with_profile(&state, move |profile| profile.rename_watchlist(&list_id, &name)).await
}

/// Delete a watchlist. Returns whether it existed.
#[tauri::command]
pub async fn remove_watchlist(
    state: State<'_, CatalogState>,
    list_id: String,
) -> Result<bool, String> {
    with_profile(&state, move |profile| profile.remove_watchlist(&list_id)).await
}

/// Add an anime to a watchlist. Returns `false` if it was already listed.
#[tauri::command]
pub async fn add_anime_to_watchlist(
    state: State<'_, CatalogState>,
    list_id: String,
    anime: AnimeRecord,
) -> Result<bool, String> {
    with_profile(&state, move |profile| profile.add_anime(&list_id, &anime)).await
}

/// Remove an anime from a watchlist. Returns whether it was listed.
#[tauri::command]
pub async fn remove_anime_from_watchlist(
    state: State<'_, CatalogState>,
    list_id: String,
    anime_id: String,
) -> Result<bool, String> {
    with_profile(&state, move |profile| {
        profile.remove_anime(&list_id, &anime_id)
    })
    .await
}

#[tauri::command]
pub async fn get_personal_info(state: State<'_, CatalogState>) -> Result<PersonalInfo, String> {
    with_profile(&state, |profile| profile.personal_info()).await
}

#[tauri::command]
pub async fn set_personal_info(
    state: State<'_, CatalogState>,
    info: PersonalInfo,
) -> Result<(), String> {
    with_profile(&state, move |profile| profile.set_personal_info(info)).await
}

/// Change only the profile name, keeping the avatar.
#[tauri::command]
pub async fn set_profile_name(
    state: State<'_, CatalogState>,
    name: String,
) -> Result<PersonalInfo, String> {
    with_profile(&state, move |profile| profile.set_name(&name)).await
}

/// Change only the avatar, usually a data URL.
#[tauri::command]
pub async fn set_profile_avatar(
    state: State<'_, CatalogState>,
    avatar: String,
) -> Result<PersonalInfo, String> {
    with_profile(&state, move |profile| profile.set_avatar(&avatar)).await
}

fn parse_season(season: &str) -> Result<Season, String> {
    Season::from_str(season).map_err(error_message)
}

/// Run a profile operation off the async runtime; the file store blocks.
async fn with_profile<T, F>(state: &CatalogState, op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&ProfileStore<FileStore>) -> anicat_core::Result<T> + Send + 'static,
{
    let profile = Arc::clone(state.profile());
    tokio::task::spawn_blocking(move || op(&profile))
        .await
        .map_err(|e| {
            error_message(AnimeError::Storage(format!("profile task failed: {}", e)))
        })?
        .map_err(error_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anicat_core::{AnimeClient, Catalog, ClientConfig};
    use proptest::prelude::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_state(label: &str) -> (CatalogState, PathBuf) {
        let dir = std::env::temp_dir()
            .join(format!("anicat-commands-{}-{}", label, Uuid::new_v4()));
        let config = ClientConfig::with_base_url("http://127.0.0.1:9");
        let catalog = Catalog::with_client(AnimeClient::with_config(config).unwrap());
        (CatalogState::with_catalog(catalog, &dir).unwrap(), dir)
    }

    fn record(id: &str) -> AnimeRecord {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "anime",
            "attributes": {"canonicalTitle": format!("Anime {}", id)}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_season() {
        assert_eq!(parse_season("fall").unwrap(), Season::Fall);
        assert_eq!(parse_season("Autumn").unwrap(), Season::Fall);
        assert!(parse_season("monsoon").unwrap_err().contains("monsoon"));
    }

    #[test]
    fn test_search_params_from_frontend_json() {
        let params: SearchParams = serde_json::from_value(serde_json::json!({
            "text": "bebop",
            "genres": ["action"],
            "seasonYear": 1998,
            "page": 2
        }))
        .unwrap();

        assert_eq!(params.text.as_deref(), Some("bebop"));
        assert_eq!(params.genres, vec!["action".to_string()]);
        assert_eq!(params.season_year, Some(1998));
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, SearchParams::default().limit);
    }

    #[tokio::test]
    async fn test_watchlist_flow_through_profile_helper() {
        let (state, dir) = temp_state("flow");

        let list = with_profile(&state, |p| p.create_watchlist("Favourites"))
            .await
            .unwrap();
        let list_id = list.id.clone();
        let added = with_profile(&state, move |p| p.add_anime(&list_id, &record("1")))
            .await
            .unwrap();
        assert!(added);

        let lists = with_profile(&state, |p| p.watchlists()).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists[0].contains("1"));

        let list_id = list.id.clone();
        let removed = with_profile(&state, move |p| p.remove_watchlist(&list_id))
            .await
            .unwrap();
        assert!(removed);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_profile_errors_become_messages() {
        let (state, dir) = temp_state("errors");

        let err = with_profile(&state, |p| p.add_anime("missing", &record("1")))
            .await
            .unwrap_err();
        assert!(err.contains("missing"));

        let err = with_profile(&state, |p| p.create_watchlist("   "))
            .await
            .unwrap_err();
        assert!(!err.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_profile_name_and_avatar_update_separately() {
        let (state, dir) = temp_state("info");

        with_profile(&state, |p| p.set_name("Asuka")).await.unwrap();
        let info = with_profile(&state, |p| p.set_avatar("data:image/png;base64,AAAA"))
            .await
            .unwrap();
        assert_eq!(info.name, "Asuka");
        assert_eq!(info.avatar, "data:image/png;base64,AAAA");

        let stored = with_profile(&state, |p| p.personal_info()).await.unwrap();
        assert_eq!(stored, info);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_panicking_profile_task_becomes_message() {
        let (state, dir) = temp_state("panic");

        let err = with_profile(&state, |_| -> anicat_core::Result<()> {
            panic!("store exploded")
        })
        .await
        .unwrap_err();
        assert!(err.contains("profile task failed"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    proptest! {
        #[test]
        fn prop_season_names_parse_in_any_case(
            index in 0usize..4,
            upper in proptest::collection::vec(any::<bool>(), 6),
        ) {
            let names = ["winter", "spring", "summer", "fall"];
            let name: String = names[index]
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                .collect();

            let parsed = parse_season(&name).unwrap();
            prop_assert_eq!(parsed.as_str(), names[index]);
        }
    }
}
