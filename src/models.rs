//! Data models for the drama catalog and playback session

use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers arrive as strings from most endpoints and as bare numbers from a few
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Catalog entry (a drama title)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(deserialize_with = "string_or_number")]
    pub book_id: String,
    #[serde(default)]
    pub book_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_wap: Option<String>,
    #[serde(default)]
    pub chapter_count: u32,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_shelf_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_library: Option<bool>,
}

impl Film {
    /// First tag, shown as the badge on cards
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Portrait image: `cover`, then `coverWap`
    pub fn poster(&self) -> Option<&str> {
        non_empty(&self.cover).or_else(|| non_empty(&self.cover_wap))
    }

    /// Wide image: `coverWap`, then `cover`
    pub fn backdrop(&self) -> Option<&str> {
        non_empty(&self.cover_wap).or_else(|| non_empty(&self.cover))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Film detail as served by the detail endpoint, optionally merged with its episodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmDetail {
    #[serde(flatten)]
    pub film: Film,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

/// One playable chapter of a film
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub chapter_id: String,
    pub chapter_name: String,
    pub chapter_index: u32,
    /// Resolved video location; `None` means the episode is unavailable
    #[serde(default)]
    pub url: Option<String>,
}

impl Episode {
    /// One-based label used by the player ("Episode 3")
    pub fn label(&self) -> String {
        format!("Episode {}", u64::from(self.chapter_index) + 1)
    }
}

/// The "continue watching" record (persisted to JSON)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub video_id: String,
    pub episode: u32,
    /// Seconds into playback
    pub timestamp: f64,
    /// Unix time of the write, filled in by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<i64>,
}

impl WatchProgress {
    pub fn new(video_id: &str, episode: u32, timestamp: f64) -> Self {
        Self {
            video_id: video_id.to_string(),
            episode,
            timestamp,
            saved_at: None,
        }
    }

    /// Route that resumes this record
    pub fn route(&self) -> WatchRoute {
        WatchRoute::new(&self.video_id, self.episode)
    }
}

/// Address of an episode page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoute {
    pub video_id: String,
    pub episode_index: u32,
}

impl WatchRoute {
    pub fn new(video_id: &str, episode_index: u32) -> Self {
        Self {
            video_id: video_id.to_string(),
            episode_index,
        }
    }

    pub fn path(&self) -> String {
        format!("/watch/{}/{}", self.video_id, self.episode_index)
    }
}

/// Path of a film's detail page
pub fn detail_path(book_id: &str) -> String {
    format!("/video/{}", book_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_deserializes_upstream_shape() {
        let json = r#"{
            "bookId": "41000102",
            "bookName": "The Heiress Returns",
            "coverWap": "https://img.example.com/41000102.jpg",
            "chapterCount": 80,
            "introduction": "A long lost daughter...",
            "tags": ["Revenge", "Romance"],
            "playCount": "1.2M",
            "unknownField": true
        }"#;
        let film: Film = serde_json::from_str(json).unwrap();
        assert_eq!(film.book_id, "41000102");
        assert_eq!(film.chapter_count, 80);
        assert_eq!(film.cover, None);
        assert_eq!(film.primary_tag(), Some("Revenge"));
        assert_eq!(film.poster(), Some("https://img.example.com/41000102.jpg"));
        assert_eq!(film.play_count.as_deref(), Some("1.2M"));
    }

    #[test]
    fn test_film_images_fall_back() {
        let film = Film {
            book_id: "1".to_string(),
            book_name: "x".to_string(),
            cover: Some("portrait.jpg".to_string()),
            cover_wap: Some(String::new()),
            chapter_count: 0,
            introduction: String::new(),
            tags: Vec::new(),
            play_count: None,
            view_count: None,
            follow_count: None,
            book_shelf_time: None,
            shelf_time: None,
            in_library: None,
        };
        assert_eq!(film.poster(), Some("portrait.jpg"));
        assert_eq!(film.backdrop(), Some("portrait.jpg"));
        assert_eq!(film.primary_tag(), None);
    }

    #[test]
    fn test_watch_progress_json_keys() {
        let progress = WatchProgress::new("41000102", 3, 12.5);
        let json = serde_json::to_string(&progress).unwrap();
        assert_eq!(json, r#"{"videoId":"41000102","episode":3,"timestamp":12.5}"#);
        assert_eq!(progress.route().path(), "/watch/41000102/3");
    }

    #[test]
    fn test_detail_flattens_film() {
        let json = r#"{"bookId": "7", "bookName": "Seven", "tags": []}"#;
        let detail: FilmDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.film.book_name, "Seven");
        assert!(detail.episodes.is_none());
        assert_eq!(detail_path(&detail.film.book_id), "/video/7");
    }

    #[test]
    fn test_episode_label_at_max_index() {
        let ep: Episode = serde_json::from_str(
            r#"{"chapterId": "c", "chapterName": "Last", "chapterIndex": 4294967295}"#,
        )
        .unwrap();
        assert_eq!(ep.label(), "Episode 4294967296");
    }
}
