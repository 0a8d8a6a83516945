//! Anicat Tauri Integration
//!
//! This crate provides Tauri commands for integrating the Anicat catalog
//! client and profile store into Tauri 2.0 applications.
//!
//! # Usage
//!
//! ```rust,ignore
//! use anicat_tauri::CatalogState;
//! use tauri::Manager;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .setup(|app| {
//!             let data_dir = app.path().app_data_dir()?;
//!             app.manage(CatalogState::new(data_dir)?);
//!             Ok(())
//!         })
//!         .invoke_handler(tauri::generate_handler![
//!             anicat_tauri::commands::search_anime,
//!             anicat_tauri::commands::trending_anime,
//!             anicat_tauri::commands::popular_anime,
//!             anicat_tauri::commands::seasonal_anime,
//!             anicat_tauri::commands::related_anime,
//!             anicat_tauri::commands::anime_details,
//!             anicat_tauri::commands::random_anime,
//!             anicat_tauri::commands::list_genres,
//!             anicat_tauri::commands::list_age_ratings,
//!             anicat_tauri::commands::list_watchlists,
//!             anicat_tauri::commands::create_watchlist,
//!             anicat_tauri::commands::rename_watchlist,
//!             anicat_tauri::commands::remove_watchlist,
//!             anicat_tauri::commands::add_anime_to_watchlist,
//!             anicat_tauri::commands::remove_anime_from_watchlist,
//!             anicat_tauri::commands::get_personal_info,
//!             anicat_tauri::commands::set_personal_info,
//!             anicat_tauri::commands::set_profile_name,
//!             anicat_tauri::commands::set_profile_avatar,
//!         ])
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! # Commands
//! - `search_anime` - Filtered, paginated search
//! - `trending_anime` / `popular_anime` / `seasonal_anime` - Discovery listings
//! - `related_anime` - Anime sharing genres with a given one
//! - `anime_details` / `random_anime` - Single hydrated anime
//! - `list_genres` / `list_age_ratings` - Reference lists for filters
//! - `list_watchlists`, `create_watchlist`, `rename_watchlist`, `remove_watchlist`,
//!   `add_anime_to_watchlist`, `remove_anime_from_watchlist` - Watchlists
//! - `get_personal_info`, `set_personal_info`, `set_profile_name`,
//!   `set_profile_avatar` - Profile details

pub mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anicat_core::{AnimeError, Catalog, FileStore, ProfileStore};
use tracing::{info, warn};

/// Catalog client plus on-disk profile data, managed by Tauri.
///
/// The catalog is cheap to clone and safe to use from many commands at
/// once; request concurrency is bounded inside the client. The profile
/// store serializes its own writes, so no outer lock is needed.
///
/// # Example
/// ```rust,ignore
/// use anicat_tauri::CatalogState;
/// use tauri::Manager;
///
/// tauri::Builder::default()
///     .setup(|app| {
///         app.manage(CatalogState::new(app.path().app_data_dir()?)?);
///         Ok(())
///     })
/// ```
pub struct CatalogState {
    catalog: Catalog,
    profile: Arc<ProfileStore<FileStore>>,
}

impl CatalogState {
    /// Create state with the catalog configured from the environment and
    /// the profile stored under `data_dir`.
    ///
    /// # Errors
    /// Returns an error string if the configuration is invalid or the data
    /// directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let catalog = Catalog::from_env().map_err(error_message)?;
        Self::with_catalog(catalog, data_dir)
    }

    /// Create state around an already configured catalog.
    pub fn with_catalog(catalog: Catalog, data_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let store = FileStore::open(data_dir).map_err(error_message)?;
        info!(dir = %store.dir().display(), "Profile store opened");
        Ok(Self {
            catalog,
            profile: Arc::new(ProfileStore::new(store)),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn profile(&self) -> &Arc<ProfileStore<FileStore>> {
        &self.profile
    }

    /// Abort every catalog request still in flight, e.g. on window close.
    pub fn shutdown(&self) {
        self.catalog.cancel();
    }
}

/// Errors cross the command boundary as plain messages
pub(crate) fn error_message(error: AnimeError) -> String {
    warn!(error = %error, "Command failed");
    error.to_string()
}
