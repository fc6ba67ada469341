//! Dracin Player - drama catalog and episode playback core
//!
//! Talks to a DramaBox-style catalog API, shapes its payloads into films and playable
//! episodes, and drives an episode's playback session against whatever media element the
//! front end provides.

pub mod api;
pub mod catalog;
pub mod config;
pub mod models;
pub mod navigator;
pub mod player;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError, CacheHint, CatalogSource};
pub use catalog::{Catalog, CatalogError, Collection, HomeRows, WatchPage};
pub use config::{AppConfig, ConfigError};
pub use models::{Episode, Film, FilmDetail, WatchProgress, WatchRoute};
pub use player::{PlaybackSession, PlaybackState, PlayerError, PlayerSettings};
pub use storage::{ProgressStore, Storage, StoreError};
