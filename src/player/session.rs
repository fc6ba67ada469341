//! Episode playback state machine
//!
//! Time is explicit: anything that arms a timer takes `now`, and [`PlaybackSession::tick`]
//! fires the deadlines that have passed. The embedding UI calls `tick` from its frame or
//! timer loop.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::{FullscreenHost, MediaElement, Orientation, PlaybackState, PlayerError};
use crate::config::AppConfig;
use crate::models::{Episode, WatchProgress, WatchRoute};
use crate::navigator;
use crate::storage::ProgressStore;

/// Timings and behaviour knobs
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Idle time before the controls overlay hides
    pub controls_hide: Duration,
    /// Delay before re-entering fullscreen after a navigation
    pub fullscreen_grace: Duration,
    /// Seconds moved by the skip buttons
    pub skip_seconds: f64,
    pub autoplay: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            controls_hide: Duration::from_secs(3),
            fullscreen_grace: Duration::from_millis(500),
            skip_seconds: 10.0,
            autoplay: true,
        }
    }
}

impl From<&AppConfig> for PlayerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            controls_hide: Duration::from_millis(config.controls_hide_ms),
            fullscreen_grace: Duration::from_millis(config.fullscreen_grace_ms),
            skip_seconds: config.skip_seconds,
            autoplay: config.autoplay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Controls {
    Visible { hide_at: Option<Instant> },
    Hidden,
}

/// Everything that only exists once the element has metadata
#[derive(Debug)]
struct Active {
    phase: Phase,
    orientation: Orientation,
    controls: Controls,
    fullscreen: bool,
}

impl Active {
    fn show_controls(&mut self, now: Instant, hide_after: Duration) {
        self.controls = Controls::Visible {
            hide_at: Some(now + hide_after),
        };
    }

    /// Interaction: push the hide deadline out if the overlay is showing
    fn touch(&mut self, now: Instant, hide_after: Duration) {
        if let Controls::Visible { .. } = self.controls {
            self.show_controls(now, hide_after);
        }
    }
}

#[derive(Debug)]
enum Stage {
    Idle,
    Unavailable,
    Active(Active),
}

fn active_mut<'a>(stage: &'a mut Stage, action: &'static str) -> Result<&'a mut Active, PlayerError> {
    match stage {
        Stage::Active(active) => Ok(active),
        Stage::Idle => Err(PlayerError::NotReady { action }),
        Stage::Unavailable => Err(PlayerError::Unavailable { action }),
    }
}

/// What the presentation layer needs to draw the player
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: PlaybackState,
    pub orientation: Option<Orientation>,
    pub controls_visible: bool,
    pub fullscreen: bool,
    /// Large centre play badge, shown while paused
    pub show_play_badge: bool,
    pub episode_label: String,
    pub episode_name: String,
    pub has_previous: bool,
    pub has_next: bool,
}

pub struct PlaybackSession<E, H, P> {
    video_id: String,
    episode: Episode,
    episodes: Vec<Episode>,
    element: E,
    host: H,
    store: P,
    settings: PlayerSettings,
    stage: Stage,
    restore_fullscreen_at: Option<Instant>,
}

impl<E, H, P> PlaybackSession<E, H, P>
where
    E: MediaElement,
    H: FullscreenHost,
    P: ProgressStore,
{
    pub fn new(
        video_id: &str,
        episode: Episode,
        episodes: Vec<Episode>,
        element: E,
        host: H,
        store: P,
    ) -> Self {
        let stage = if episode.url.is_some() {
            Stage::Idle
        } else {
            Stage::Unavailable
        };

        Self {
            video_id: video_id.to_string(),
            episode,
            episodes,
            element,
            host,
            store,
            settings: PlayerSettings::default(),
            stage,
            restore_fullscreen_at: None,
        }
    }

    pub fn with_settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attach to the page. Picks up a fullscreen intent left by the previous episode.
    pub fn mount(mut self, now: Instant) -> Self {
        match self.stage {
            Stage::Unavailable => {
                info!(
                    "[PLAY] {} episode {} unavailable: no video URL",
                    self.video_id, self.episode.chapter_index
                );
            }
            _ => {
                if self.store.consume_fullscreen_intent() {
                    debug!("Restoring fullscreen in {:?}", self.settings.fullscreen_grace);
                    self.restore_fullscreen_at = Some(now + self.settings.fullscreen_grace);
                }
            }
        }
        self
    }

    pub fn state(&self) -> PlaybackState {
        match &self.stage {
            Stage::Idle => PlaybackState::Idle,
            Stage::Unavailable => PlaybackState::Unavailable,
            Stage::Active(active) => match active.phase {
                Phase::Ready => PlaybackState::Ready,
                Phase::Playing => PlaybackState::Playing,
                Phase::Paused => PlaybackState::Paused,
                Phase::Ended => PlaybackState::Ended,
            },
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        matches!(&self.stage, Stage::Active(active) if active.fullscreen)
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn view(&self) -> SessionView {
        let (orientation, controls_visible) = match &self.stage {
            Stage::Active(active) => (
                Some(active.orientation),
                matches!(active.controls, Controls::Visible { .. }),
            ),
            _ => (None, false),
        };
        let state = self.state();

        SessionView {
            state,
            orientation,
            controls_visible,
            fullscreen: self.is_fullscreen(),
            show_play_badge: state == PlaybackState::Paused,
            episode_label: self.episode.label(),
            episode_name: self.episode.chapter_name.clone(),
            has_previous: navigator::previous(&self.episodes, self.episode.chapter_index).is_some(),
            has_next: navigator::next(&self.episodes, self.episode.chapter_index).is_some(),
        }
    }

    /// Element decoded its metadata: Idle -> Ready. Orientation is decided here, once.
    pub fn on_loaded_metadata(&mut self, now: Instant) {
        if !matches!(self.stage, Stage::Idle) {
            debug!("Ignoring metadata event in {:?}", self.state());
            return;
        }

        let (width, height) = self.element.video_size();
        let orientation = Orientation::from_dimensions(width, height);
        info!(
            "[PLAY] {} episode {} ready ({}x{}, {:?})",
            self.video_id, self.episode.chapter_index, width, height, orientation
        );

        let mut active = Active {
            phase: Phase::Ready,
            orientation,
            controls: Controls::Visible { hide_at: None },
            fullscreen: self.host.is_fullscreen(),
        };

        if self.settings.autoplay {
            self.element.play();
            active.phase = Phase::Playing;
            active.touch(now, self.settings.controls_hide);
        }

        self.stage = Stage::Active(active);
        self.restore_fullscreen(now);
    }

    /// Element started playing on its own (autoplay, media keys)
    pub fn on_play(&mut self, now: Instant) {
        if let Stage::Active(active) = &mut self.stage {
            active.phase = Phase::Playing;
            active.touch(now, self.settings.controls_hide);
        }
    }

    pub fn on_pause(&mut self) {
        if let Stage::Active(active) = &mut self.stage {
            if active.phase == Phase::Playing {
                active.phase = Phase::Paused;
            }
        }
    }

    /// Playback position advanced; persist it as the continue-watching record
    pub fn on_time_update(&mut self) {
        if !matches!(self.stage, Stage::Active(_)) {
            return;
        }

        let progress = WatchProgress::new(
            &self.video_id,
            self.episode.chapter_index,
            self.element.current_time(),
        );
        if let Err(e) = self.store.save_progress(&progress) {
            warn!("Failed to save progress: {}", e);
        }
    }

    /// Reached the end: auto-advance to the next episode when there is one
    pub fn on_ended(&mut self) -> Option<WatchRoute> {
        if let Stage::Active(active) = &mut self.stage {
            active.phase = Phase::Ended;
        }
        self.next_episode()
    }

    /// Host reported a fullscreen change (including ones the user made outside the controls)
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        if let Stage::Active(active) = &mut self.stage {
            active.fullscreen = fullscreen;
        }
    }

    /// Play/pause button
    pub fn toggle_play(&mut self, now: Instant) -> Result<(), PlayerError> {
        let active = active_mut(&mut self.stage, "toggle playback")?;
        if self.element.is_paused() {
            self.element.play();
            active.phase = Phase::Playing;
        } else {
            self.element.pause();
            active.phase = Phase::Paused;
        }
        active.touch(now, self.settings.controls_hide);
        Ok(())
    }

    /// Tap on the video area: toggle playback and bring the controls back
    pub fn tap(&mut self, now: Instant) -> Result<(), PlayerError> {
        self.toggle_play(now)?;
        let active = active_mut(&mut self.stage, "show controls")?;
        active.show_controls(now, self.settings.controls_hide);
        Ok(())
    }

    pub fn toggle_controls(&mut self, now: Instant) -> Result<(), PlayerError> {
        let active = active_mut(&mut self.stage, "toggle controls")?;
        match active.controls {
            Controls::Visible { .. } => active.controls = Controls::Hidden,
            Controls::Hidden => active.show_controls(now, self.settings.controls_hide),
        }
        Ok(())
    }

    pub fn skip_forward(&mut self, now: Instant) -> Result<(), PlayerError> {
        self.seek_by(self.settings.skip_seconds, now)
    }

    pub fn skip_backward(&mut self, now: Instant) -> Result<(), PlayerError> {
        self.seek_by(-self.settings.skip_seconds, now)
    }

    fn seek_by(&mut self, delta: f64, now: Instant) -> Result<(), PlayerError> {
        let active = active_mut(&mut self.stage, "seek")?;
        let target = self.element.current_time() + delta;
        self.element.set_current_time(target);
        active.touch(now, self.settings.controls_hide);
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self, now: Instant) -> Result<(), PlayerError> {
        let active = active_mut(&mut self.stage, "toggle fullscreen")?;
        let entering = !self.host.is_fullscreen();
        let result = if entering {
            self.host.request_fullscreen()
        } else {
            self.host.exit_fullscreen()
        };

        if let Err(e) = result {
            error!("Fullscreen error: {}", e);
            return Err(PlayerError::Fullscreen(e));
        }

        active.fullscreen = entering;
        active.touch(now, self.settings.controls_hide);
        Ok(())
    }

    pub fn next_episode(&mut self) -> Option<WatchRoute> {
        let target = navigator::next(&self.episodes, self.episode.chapter_index)?.chapter_index;
        Some(self.navigate(target))
    }

    pub fn previous_episode(&mut self) -> Option<WatchRoute> {
        let target = navigator::previous(&self.episodes, self.episode.chapter_index)?.chapter_index;
        Some(self.navigate(target))
    }

    /// Leaving this session: hand the fullscreen state to the next one
    fn navigate(&mut self, episode_index: u32) -> WatchRoute {
        if self.is_fullscreen() || self.host.is_fullscreen() {
            if let Err(e) = self.store.set_fullscreen_intent() {
                warn!("Failed to remember fullscreen across navigation: {}", e);
            }
        }

        let route = WatchRoute::new(&self.video_id, episode_index);
        info!("[PLAY] Navigating to {}", route.path());
        route
    }

    /// Fire due timers
    pub fn tick(&mut self, now: Instant) {
        if let Stage::Active(active) = &mut self.stage {
            if let Controls::Visible { hide_at: Some(at) } = active.controls {
                if now >= at {
                    active.controls = Controls::Hidden;
                }
            }
        }
        self.restore_fullscreen(now);
    }

    /// Waits for both the grace deadline and a ready element
    fn restore_fullscreen(&mut self, now: Instant) {
        let Some(at) = self.restore_fullscreen_at else {
            return;
        };
        if now < at {
            return;
        }
        let Stage::Active(active) = &mut self.stage else {
            return;
        };

        self.restore_fullscreen_at = None;
        if self.host.is_fullscreen() {
            active.fullscreen = true;
            return;
        }
        match self.host.request_fullscreen() {
            Ok(()) => active.fullscreen = true,
            Err(e) => warn!("Fullscreen request failed: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
