//! Seams to the platform media element and the fullscreen-capable container

/// The video element a session is bound to.
///
/// Seeks are not bounds-checked by the session; keeping the position inside the media is
/// the element's job.
pub trait MediaElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Playback position in seconds
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    /// Intrinsic (width, height), valid once metadata has loaded
    fn video_size(&self) -> (u32, u32);
}

/// The player container that can enter and leave fullscreen
pub trait FullscreenHost {
    fn request_fullscreen(&mut self) -> Result<(), String>;
    fn exit_fullscreen(&mut self) -> Result<(), String>;
    fn is_fullscreen(&self) -> bool;
}

impl<T: MediaElement + ?Sized> MediaElement for &mut T {
    fn play(&mut self) {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn set_current_time(&mut self, secs: f64) {
        (**self).set_current_time(secs)
    }

    fn video_size(&self) -> (u32, u32) {
        (**self).video_size()
    }
}

impl<T: FullscreenHost + ?Sized> FullscreenHost for &mut T {
    fn request_fullscreen(&mut self) -> Result<(), String> {
        (**self).request_fullscreen()
    }

    fn exit_fullscreen(&mut self) -> Result<(), String> {
        (**self).exit_fullscreen()
    }

    fn is_fullscreen(&self) -> bool {
        (**self).is_fullscreen()
    }
}
