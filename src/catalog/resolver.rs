//! Payload normalization for the DramaBox envelopes

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::CatalogError;
use crate::models::{string_or_number, Episode, Film, FilmDetail};

static EP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^EP\s+(\d+)").expect("episode prefix regex should compile"));

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEpisode {
    #[serde(deserialize_with = "string_or_number")]
    chapter_id: String,
    #[serde(default)]
    chapter_name: Option<String>,
    chapter_index: u32,
    #[serde(default)]
    cdn_list: Option<Vec<RawCdn>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCdn {
    #[serde(default)]
    is_default: Value,
    #[serde(default)]
    video_path_list: Option<Vec<RawVideoPath>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoPath {
    #[serde(default)]
    is_default: Value,
    #[serde(default)]
    video_path: Option<String>,
}

fn is_default(flag: &Value) -> bool {
    flag.as_i64() == Some(1)
}

impl RawEpisode {
    /// Path of the default quality on the default CDN
    fn default_video(&self) -> Option<String> {
        let cdn = self.cdn_list.as_ref()?.iter().find(|cdn| is_default(&cdn.is_default))?;
        let video = cdn
            .video_path_list
            .as_ref()?
            .iter()
            .find(|video| is_default(&video.is_default))?;
        video.video_path.clone().filter(|path| !path.is_empty())
    }

    fn into_episode(self) -> Episode {
        let url = self.default_video();
        Episode {
            chapter_name: normalize_episode_name(self.chapter_name.as_deref(), self.chapter_index),
            chapter_id: self.chapter_id,
            chapter_index: self.chapter_index,
            url,
        }
    }
}

/// "EP 3 ..." becomes "Episode 3 ..."; a missing name becomes "Episode <index + 1>"
pub fn normalize_episode_name(raw: Option<&str>, chapter_index: u32) -> String {
    match raw.filter(|name| !name.is_empty()) {
        Some(name) => EP_PREFIX.replace(name, "Episode ${1}").into_owned(),
        None => format!("Episode {}", u64::from(chapter_index) + 1),
    }
}

/// Collection rows live at `columnVoList[0].bookList`; when that path is missing the
/// payload itself is taken as the row.
pub fn films_from_payload(mut payload: Value) -> Vec<Film> {
    let nested = payload
        .pointer_mut("/columnVoList/0/bookList")
        .map(Value::take);

    let rows = match nested {
        Some(list) if !list.is_null() => list,
        _ => payload,
    };

    match rows {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Film>(item) {
                Ok(film) => Some(film),
                Err(e) => {
                    debug!("Skipping catalog entry: {}", e);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("Unexpected collection payload ({}), treating as empty", kind(&other));
            Vec::new()
        }
    }
}

/// Detail lives at `data.book`
pub fn detail_from_payload(endpoint: &str, mut payload: Value) -> Result<FilmDetail, CatalogError> {
    let book = payload
        .pointer_mut("/data/book")
        .map(Value::take)
        .filter(|book| !book.is_null())
        .ok_or_else(|| CatalogError::Resolution {
            endpoint: endpoint.to_string(),
            reason: "missing data.book".to_string(),
        })?;

    serde_json::from_value(book).map_err(|e| CatalogError::Resolution {
        endpoint: endpoint.to_string(),
        reason: format!("malformed data.book: {}", e),
    })
}

/// The episode endpoint answers with a bare array of chapter records
pub fn episodes_from_payload(endpoint: &str, payload: Value) -> Result<Vec<Episode>, CatalogError> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(CatalogError::Resolution {
                endpoint: endpoint.to_string(),
                reason: format!("expected an episode array, got {}", kind(&other)),
            })
        }
    };

    let episodes = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawEpisode>(item) {
            Ok(raw) => Some(raw.into_episode()),
            Err(e) => {
                warn!("Skipping malformed episode from {}: {}", endpoint, e);
                None
            }
        })
        .collect();

    Ok(episodes)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
