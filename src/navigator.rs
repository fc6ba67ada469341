//! Previous/next episode lookup.
//!
//! Neighbours are found by exact `chapter_index` match, never by position in the slice,
//! so a gap in the indices ends navigation at the gap.

use crate::models::Episode;

/// Episode whose index is `current - 1`, if any
pub fn previous(episodes: &[Episode], current: u32) -> Option<&Episode> {
    let wanted = current.checked_sub(1)?;
    episodes.iter().find(|ep| ep.chapter_index == wanted)
}

/// Episode whose index is `current + 1`, if any
pub fn next(episodes: &[Episode], current: u32) -> Option<&Episode> {
    let wanted = current.checked_add(1)?;
    episodes.iter().find(|ep| ep.chapter_index == wanted)
}

/// Episode with exactly this index
pub fn find(episodes: &[Episode], index: u32) -> Option<&Episode> {
    episodes.iter().find(|ep| ep.chapter_index == index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(index: u32) -> Episode {
        Episode {
            chapter_id: format!("c{}", index),
            chapter_name: format!("Episode {}", index + 1),
            chapter_index: index,
            url: None,
        }
    }

    fn list(indices: &[u32]) -> Vec<Episode> {
        indices.iter().copied().map(episode).collect()
    }

    #[test]
    fn test_boundaries_return_none() {
        let episodes = list(&[0, 1, 2]);
        assert!(next(&episodes, 2).is_none());
        assert!(previous(&episodes, 0).is_none());
        assert_eq!(next(&episodes, 0).map(|e| e.chapter_index), Some(1));
        assert_eq!(previous(&episodes, 2).map(|e| e.chapter_index), Some(1));
    }

    #[test]
    fn test_lookup_ignores_slice_order() {
        let episodes = list(&[2, 0, 1]);
        assert_eq!(next(&episodes, 0).map(|e| e.chapter_id.as_str()), Some("c1"));
        assert_eq!(previous(&episodes, 1).map(|e| e.chapter_id.as_str()), Some("c0"));
    }

    #[test]
    fn test_gap_breaks_navigation() {
        let episodes = list(&[0, 1, 3]);
        assert!(next(&episodes, 1).is_none());
        assert!(previous(&episodes, 3).is_none());
        assert!(find(&episodes, 2).is_none());
        assert_eq!(find(&episodes, 3).map(|e| e.chapter_index), Some(3));
    }

    #[test]
    fn test_empty_list() {
        assert!(next(&[], 0).is_none());
        assert!(previous(&[], 5).is_none());
    }
}
