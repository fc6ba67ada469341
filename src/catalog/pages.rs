//! Data assembly for the home, film and watch pages.
//!
//! Every page issues its fetches concurrently and joins them before returning.
//! Collection rows fail independently and degrade to empty; single-entity pages propagate.

use std::panic;
use std::thread::{self, ScopedJoinHandle};

use log::{error, warn};

use super::{Catalog, CatalogError, Collection};
use crate::api::CatalogSource;
use crate::models::{Episode, Film, FilmDetail};
use crate::navigator;

/// Rows of the home page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeRows {
    pub latest: Vec<Film>,
    pub trending: Vec<Film>,
    pub popular: Vec<Film>,
    pub for_you: Vec<Film>,
    /// Set only when the page was opened with a search term
    pub search_results: Option<Vec<Film>>,
}

/// Everything the watch page renders
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPage {
    pub film: FilmDetail,
    pub episode: Episode,
    pub episodes: Vec<Episode>,
}

impl WatchPage {
    pub fn previous(&self) -> Option<&Episode> {
        navigator::previous(&self.episodes, self.episode.chapter_index)
    }

    pub fn next(&self) -> Option<&Episode> {
        navigator::next(&self.episodes, self.episode.chapter_index)
    }
}

fn joined<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload))
}

impl<S: CatalogSource> Catalog<S> {
    /// A failed row is logged and rendered empty
    fn row(&self, collection: Collection) -> Vec<Film> {
        self.collection(collection).unwrap_or_else(|e| {
            warn!("{} row unavailable: {}", collection.label(), e);
            Vec::new()
        })
    }

    pub fn home(&self, search: Option<&str>) -> HomeRows {
        if let Some(query) = search.map(str::trim).filter(|q| !q.is_empty()) {
            let results = self.search(query).unwrap_or_else(|e| {
                error!("Search for '{}' failed: {}", query, e);
                Vec::new()
            });
            return HomeRows {
                search_results: Some(results),
                ..HomeRows::default()
            };
        }

        thread::scope(|scope| {
            let latest = scope.spawn(|| self.row(Collection::Latest));
            let trending = scope.spawn(|| self.row(Collection::Trending));
            let popular = scope.spawn(|| self.row(Collection::PopularSearch));
            let for_you = scope.spawn(|| self.row(Collection::ForYou));

            HomeRows {
                latest: joined(latest),
                trending: joined(trending),
                popular: joined(popular),
                for_you: joined(for_you),
                search_results: None,
            }
        })
    }

    /// Detail merged with the full episode list
    pub fn film_page(&self, book_id: &str) -> Result<FilmDetail, CatalogError> {
        let (detail, episodes) = thread::scope(|scope| {
            let detail = scope.spawn(|| self.detail(book_id));
            let episodes = scope.spawn(|| self.episodes(book_id));
            (joined(detail), joined(episodes))
        });

        let mut detail = detail.inspect_err(|e| error!("Failed to load film {}: {}", book_id, e))?;
        let episodes = episodes.inspect_err(|e| error!("Failed to load episodes of {}: {}", book_id, e))?;
        detail.episodes = Some(episodes);
        Ok(detail)
    }

    /// Film, the requested episode (by exact index) and the ordered list around it
    pub fn watch_page(&self, video_id: &str, episode_index: u32) -> Result<WatchPage, CatalogError> {
        let (episodes, film) = thread::scope(|scope| {
            let episodes = scope.spawn(|| self.episodes(video_id));
            let film = scope.spawn(|| self.detail(video_id));
            (joined(episodes), joined(film))
        });

        let episodes = episodes.inspect_err(|e| error!("Failed to load episodes of {}: {}", video_id, e))?;
        let film = film.inspect_err(|e| error!("Failed to load film {}: {}", video_id, e))?;

        let episode = navigator::find(&episodes, episode_index)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                video_id: video_id.to_string(),
                episode_index,
            })?;

        Ok(WatchPage {
            film,
            episode,
            episodes,
        })
    }
}
