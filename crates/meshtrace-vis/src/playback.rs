//! Playback controls for scrubbing a reconstructed topology timeline.
//!
//! The controller owns a built [`SnapshotHistory`] and a frame cursor.
//! Seeking is an index lookup: snapshots were captured during the build,
//! so no re-folding happens while the user drags the slider.

use meshtrace_engine::{SnapshotEntry, SnapshotHistory};
use serde::{Deserialize, Serialize};

/// Playback speed multiplier for timed stepping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// Hold the current frame
    Paused,
    /// 0.5x speed
    Half,
    /// Normal speed (1x)
    Normal,
    /// 2x speed
    Double,
    /// 10x speed
    TenX,
    /// As fast as the frontend can draw
    Maximum,
}

impl PlaybackSpeed {
    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Paused => 0.0,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::TenX => 10.0,
            PlaybackSpeed::Maximum => f64::INFINITY,
        }
    }

    /// Milliseconds per frame at this speed, `None` while paused.
    pub fn ms_per_frame(&self, base_ms: u64) -> Option<u64> {
        match self {
            PlaybackSpeed::Paused => None,
            PlaybackSpeed::Maximum => Some(0),
            speed => Some((base_ms as f64 / speed.multiplier()) as u64),
        }
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Cursor at the first frame, not running
    Stopped,
    /// Advancing through frames
    Playing,
    /// Holding the current frame
    Paused,
    /// Cursor reached the last frame
    Finished,
}

/// Frame cursor over a snapshot history.
pub struct Playback {
    history: SnapshotHistory,
    current_frame: usize,
    state: PlaybackState,
    speed: PlaybackSpeed,
    loop_enabled: bool,
}

impl Playback {
    /// Create a controller positioned at the first frame.
    pub fn new(history: SnapshotHistory) -> Self {
        Self {
            history,
            current_frame: 0,
            state: PlaybackState::Stopped,
            speed: PlaybackSpeed::Normal,
            loop_enabled: false,
        }
    }

    /// The frame (tick index) the cursor points at.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Total frames, equal to the history's tick count.
    pub fn total_frames(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// The underlying history.
    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// The snapshot under the cursor, `None` for an empty history.
    pub fn current_snapshot(&self) -> Option<&SnapshotEntry> {
        self.history.at(self.current_frame)
    }

    /// Move the cursor, clamped to the valid frame range.
    pub fn seek(&mut self, frame: usize) {
        let last = self.history.len().saturating_sub(1);
        self.current_frame = frame.min(last);
        if !self.history.is_empty() && self.current_frame == last && !self.loop_enabled {
            self.state = PlaybackState::Finished;
        }
    }

    /// Start advancing from the current frame (or the start, if finished).
    pub fn play(&mut self) {
        if self.current_frame + 1 >= self.history.len() {
            self.current_frame = 0;
        }
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Return the cursor to the first frame.
    pub fn stop(&mut self) {
        self.current_frame = 0;
        self.state = PlaybackState::Stopped;
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        if matches!(speed, PlaybackSpeed::Paused) {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Advance one frame; wraps when looping, finishes at the end.
    pub fn step_forward(&mut self) -> Option<&SnapshotEntry> {
        if self.history.is_empty() {
            self.state = PlaybackState::Finished;
            return None;
        }
        if self.current_frame + 1 < self.history.len() {
            self.current_frame += 1;
        } else if self.loop_enabled {
            self.current_frame = 0;
        } else {
            self.state = PlaybackState::Finished;
            return None;
        }
        if self.current_frame + 1 == self.history.len() && !self.loop_enabled {
            self.state = PlaybackState::Finished;
        }
        self.history.at(self.current_frame)
    }

    /// Step back one frame and hold there.
    pub fn step_backward(&mut self) -> Option<&SnapshotEntry> {
        if self.current_frame > 0 {
            self.current_frame -= 1;
            self.state = PlaybackState::Paused;
        }
        self.history.at(self.current_frame)
    }

    /// Scrub position as a fraction (0.0 - 1.0).
    pub fn progress(&self) -> f64 {
        let last = self.history.len().saturating_sub(1);
        if last == 0 {
            0.0
        } else {
            self.current_frame as f64 / last as f64
        }
    }
}

/// Playback status for sending to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_frame: usize,
    pub total_frames: usize,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub progress: f64,
    pub loop_enabled: bool,
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        Self {
            current_frame: playback.current_frame,
            total_frames: playback.total_frames(),
            state: playback.state,
            speed: playback.speed,
            progress: playback.progress(),
            loop_enabled: playback.loop_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(ticks: usize) -> SnapshotHistory {
        let log: String = (0..ticks)
            .map(|i| format!("[sim] Created new node ID: n{i}, x: {i}, y: 0\n"))
            .collect();
        SnapshotHistory::build(&log)
    }

    #[test]
    fn starts_at_the_first_frame() {
        let playback = Playback::new(history(10));
        assert_eq!(playback.current_frame(), 0);
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.total_frames(), 10);
    }

    #[test]
    fn seek_clamps_to_bounds() {
        let mut playback = Playback::new(history(10));

        playback.seek(5);
        assert_eq!(playback.current_frame(), 5);

        playback.seek(100);
        assert_eq!(playback.current_frame(), 9);
        assert_eq!(playback.state(), PlaybackState::Finished);

        playback.seek(0);
        assert_eq!(playback.current_frame(), 0);
    }

    #[test]
    fn seeking_indexes_prebuilt_snapshots() {
        let mut playback = Playback::new(history(5));
        playback.seek(2);

        let entry = playback.current_snapshot().unwrap();
        assert_eq!(entry.event_index, 2);
        assert_eq!(entry.state.len(), 3);
    }

    #[test]
    fn step_forward_finishes_at_the_end() {
        let mut playback = Playback::new(history(3));

        assert!(playback.step_forward().is_some());
        assert!(playback.step_forward().is_some());
        assert_eq!(playback.state(), PlaybackState::Finished);
        assert!(playback.step_forward().is_none());
        assert_eq!(playback.current_frame(), 2);
    }

    #[test]
    fn loop_wraps_to_the_start() {
        let mut playback = Playback::new(history(3));
        playback.set_loop(true);

        playback.seek(2);
        assert!(playback.step_forward().is_some());
        assert_eq!(playback.current_frame(), 0);
        assert_ne!(playback.state(), PlaybackState::Finished);
    }

    #[test]
    fn step_backward_pauses() {
        let mut playback = Playback::new(history(3));
        playback.seek(2);
        playback.step_backward();
        assert_eq!(playback.current_frame(), 1);
        assert_eq!(playback.state(), PlaybackState::Paused);
    }

    #[test]
    fn progress_spans_the_slider() {
        let mut playback = Playback::new(history(5));
        assert_eq!(playback.progress(), 0.0);

        playback.seek(2);
        assert_eq!(playback.progress(), 0.5);

        playback.seek(4);
        assert_eq!(playback.progress(), 1.0);
    }

    #[test]
    fn empty_history_is_inert() {
        let mut playback = Playback::new(SnapshotHistory::build(""));
        assert_eq!(playback.total_frames(), 0);
        assert!(playback.current_snapshot().is_none());
        assert!(playback.step_forward().is_none());
        playback.seek(10);
        assert_eq!(playback.current_frame(), 0);
    }

    #[test]
    fn speed_multipliers() {
        assert_eq!(PlaybackSpeed::Paused.multiplier(), 0.0);
        assert_eq!(PlaybackSpeed::Double.multiplier(), 2.0);
        assert!(PlaybackSpeed::Maximum.multiplier().is_infinite());
        assert_eq!(PlaybackSpeed::Half.ms_per_frame(100), Some(200));
        assert_eq!(PlaybackSpeed::Paused.ms_per_frame(100), None);
    }

    #[test]
    fn status_reflects_the_cursor() {
        let mut playback = Playback::new(history(10));
        playback.seek(3);
        playback.set_speed(PlaybackSpeed::Double);

        let status = PlaybackStatus::from(&playback);
        assert_eq!(status.current_frame, 3);
        assert_eq!(status.total_frames, 10);
        assert_eq!(status.speed, PlaybackSpeed::Double);
    }
}
