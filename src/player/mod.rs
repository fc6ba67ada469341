//! Playback session controller
//!
//! One [`PlaybackSession`] drives one episode. Moving to another episode is a navigation,
//! so every episode gets a fresh session; state that must outlive it (resume position,
//! fullscreen) goes through the [`ProgressStore`](crate::storage::ProgressStore).

mod element;
mod session;

use thiserror::Error;

pub use element::{FullscreenHost, MediaElement};
pub use session::{PlaybackSession, PlayerSettings, SessionView};

/// Primary state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting for the element to decode metadata
    Idle,
    Ready,
    Playing,
    Paused,
    Ended,
    /// The episode has no playable URL. Terminal.
    Unavailable,
}

/// Rendering mode, fixed once metadata is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Portrait when width/height < 1
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height > 0 && (width as f64) / (height as f64) < 1.0 {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Cannot {action} before the video is ready")]
    NotReady { action: &'static str },
    #[error("Cannot {action}: this episode is currently unavailable")]
    Unavailable { action: &'static str },
    #[error("Fullscreen error: {0}")]
    Fullscreen(String),
}
