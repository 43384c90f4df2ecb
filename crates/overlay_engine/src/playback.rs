//! Playback clock: decides when a time change warrants a redraw.
//!
//! Mirrors a media element's event stream. `timeupdate` events are coarse
//! and throttled at ~30 Hz, seeks always redraw, and while playing an
//! animation-frame loop refreshes at ~60 Hz.

/// Minimum change for a `timeupdate` redraw (seconds)
pub const TIME_UPDATE_THRESHOLD_S: f64 = 0.033;
/// Minimum change for an animation-frame redraw while playing (seconds)
pub const ANIMATION_FRAME_THRESHOLD_S: f64 = 0.016;

/// Redraw policy for one player
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    playing: bool,
    last_emitted: f64,
    emitted: u64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Time of the last redraw
    pub fn current_time(&self) -> f64 {
        self.last_emitted
    }

    /// Number of redraws emitted
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Start the animation-frame loop
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stop the animation-frame loop
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Tear down (player unmounted or source changed)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Media `timeupdate`: redraw when time moved more than ~1/30 s
    pub fn time_update(&mut self, time: f64) -> Option<f64> {
        self.emit_if_moved(time, TIME_UPDATE_THRESHOLD_S)
    }

    /// Media `seeked`: always redraw
    pub fn seeked(&mut self, time: f64) -> f64 {
        let time = sanitize(time);
        self.emit(time);
        time
    }

    /// Animation frame tick: while playing, redraw when time moved more than ~1/60 s
    pub fn animation_frame(&mut self, time: f64) -> Option<f64> {
        if !self.playing {
            return None;
        }
        self.emit_if_moved(time, ANIMATION_FRAME_THRESHOLD_S)
    }

    fn emit_if_moved(&mut self, time: f64, threshold: f64) -> Option<f64> {
        let time = sanitize(time);
        if (time - self.last_emitted).abs() > threshold {
            self.emit(time);
            Some(time)
        } else {
            None
        }
    }

    fn emit(&mut self, time: f64) {
        self.last_emitted = time;
        self.emitted += 1;
    }
}

/// A missing or non-finite media time reads as 0
fn sanitize(time: f64) -> f64 {
    if time.is_finite() {
        time
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_update_threshold() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.time_update(0.03), None);
        assert_eq!(clock.time_update(0.04), Some(0.04));
        // measured from the last emitted time, not the last event
        assert_eq!(clock.time_update(0.07), None);
        assert_eq!(clock.time_update(0.08), Some(0.08));
    }

    #[test]
    fn test_seeked_always_emits() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.seeked(0.0), 0.0);
        assert_eq!(clock.seeked(0.001), 0.001);
        assert_eq!(clock.emitted(), 2);
        assert_eq!(clock.current_time(), 0.001);
    }

    #[test]
    fn test_animation_frame_only_while_playing() {
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.animation_frame(1.0), None);

        clock.play();
        assert_eq!(clock.animation_frame(0.01), None);
        assert_eq!(clock.animation_frame(0.02), Some(0.02));
        assert_eq!(clock.animation_frame(0.03), None);

        clock.pause();
        assert_eq!(clock.animation_frame(2.0), None);
    }

    #[test]
    fn test_reset_and_bad_time() {
        let mut clock = PlaybackClock::new();
        clock.play();
        clock.seeked(5.0);
        clock.reset();
        assert!(!clock.is_playing());
        assert_eq!(clock.emitted(), 0);
        assert_eq!(clock.seeked(f64::NAN), 0.0);
    }
}
