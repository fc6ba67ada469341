//! Catalog resolver
//!
//! Turns the upstream's inconsistent envelopes into [`Film`] and [`Episode`] values,
//! and assembles the data each page needs before it renders.

mod pages;
mod resolver;

use log::debug;
use thiserror::Error;

use crate::api::{ApiError, CacheHint, CatalogSource};
use crate::models::{Episode, Film, FilmDetail};

pub use pages::{HomeRows, WatchPage};
pub use resolver::{
    detail_from_payload,
    episodes_from_payload,
    films_from_payload,
    normalize_episode_name,
};

/// Detail and episode lists change rarely; let caches keep them for an hour
const DETAIL_REVALIDATE_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Unresolved response from {endpoint}: {reason}")]
    Resolution { endpoint: String, reason: String },
    #[error("Episode {episode_index} of {video_id} not found")]
    NotFound { video_id: String, episode_index: u32 },
}

/// Collection rows offered by the upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Vip,
    Dubindo,
    RandomDrama,
    ForYou,
    Latest,
    Trending,
    PopularSearch,
}

impl Collection {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Collection::Vip => "/dramabox/vip",
            Collection::Dubindo => "/dramabox/dubindo",
            Collection::RandomDrama => "/dramabox/randomdrama",
            Collection::ForYou => "/dramabox/foryou",
            Collection::Latest => "/dramabox/latest",
            Collection::Trending => "/dramabox/trending",
            Collection::PopularSearch => "/dramabox/populersearch",
        }
    }

    /// Row heading
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Vip => "VIP",
            Collection::Dubindo => "Dubbed",
            Collection::RandomDrama => "Random Picks",
            Collection::ForYou => "For You",
            Collection::Latest => "Latest",
            Collection::Trending => "Trending",
            Collection::PopularSearch => "Popular Searches",
        }
    }
}

pub const SEARCH_ENDPOINT: &str = "/dramabox/search";
pub const DETAIL_ENDPOINT: &str = "/dramabox/detail";
pub const EPISODES_ENDPOINT: &str = "/dramabox/allepisode";

pub struct Catalog<S> {
    source: S,
}

impl<S: CatalogSource> Catalog<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn collection(&self, collection: Collection) -> Result<Vec<Film>, CatalogError> {
        let payload = self.source.call(collection.endpoint(), &[], None)?;
        let films = films_from_payload(payload);
        debug!("Loaded {} films from {}", films.len(), collection.endpoint());
        Ok(films)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Film>, CatalogError> {
        let payload = self.source.call(SEARCH_ENDPOINT, &[("query", query)], None)?;
        Ok(films_from_payload(payload))
    }

    pub fn detail(&self, book_id: &str) -> Result<FilmDetail, CatalogError> {
        let hint = CacheHint::revalidate(DETAIL_REVALIDATE_SECS).tag(format!("detail-{}", book_id));
        let payload = self
            .source
            .call(DETAIL_ENDPOINT, &[("bookId", book_id)], Some(&hint))?;
        detail_from_payload(DETAIL_ENDPOINT, payload)
    }

    pub fn episodes(&self, book_id: &str) -> Result<Vec<Episode>, CatalogError> {
        let hint = CacheHint::revalidate(DETAIL_REVALIDATE_SECS).tag(format!("episodes-{}", book_id));
        let payload = self
            .source
            .call(EPISODES_ENDPOINT, &[("bookId", book_id)], Some(&hint))?;
        let episodes = episodes_from_payload(EPISODES_ENDPOINT, payload)?;
        debug!("Loaded {} episodes for {}", episodes.len(), book_id);
        Ok(episodes)
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
