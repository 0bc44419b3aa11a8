//! Audio cue sinks
//!
//! Playback itself belongs to the host platform. The simulation only names
//! the cue it wants; a sink decides what to do with it.

use serde::{Deserialize, Serialize};

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    /// Runner jumped
    Jump,
    /// Runner started a slide
    Slide,
    /// Coin collected
    PickupCoin,
    /// Trash collected
    PickupTrash,
    /// Runner hit an obstacle
    HitObstacle,
    /// Menu button pressed
    ButtonClick,
}

impl AudioCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCue::Jump => "jump",
            AudioCue::Slide => "slide",
            AudioCue::PickupCoin => "pickup_coin",
            AudioCue::PickupTrash => "pickup_trash",
            AudioCue::HitObstacle => "hit_obstacle",
            AudioCue::ButtonClick => "button_click",
        }
    }
}

/// Receives cues from gameplay
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Logs cues at debug level; used by the headless driver
#[derive(Debug, Default)]
pub struct LogAudio {
    muted: bool,
    played: u64,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mute/unmute sound effects
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Cues actually played (muted cues are not counted)
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, cue: AudioCue) {
        if self.muted {
            return;
        }
        self.played += 1;
        log::debug!("sfx: {}", cue.as_str());
    }
}

/// Remembers every cue in order
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub cues: Vec<AudioCue>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_sink_counts_nothing() {
        let mut audio = LogAudio::new();
        audio.play(AudioCue::Jump);
        audio.set_muted(true);
        audio.play(AudioCue::HitObstacle);
        assert!(audio.is_muted());
        assert_eq!(audio.played(), 1);
    }

    #[test]
    fn test_recording_keeps_order() {
        let mut audio = RecordingAudio::default();
        audio.play(AudioCue::PickupCoin);
        audio.play(AudioCue::PickupTrash);
        assert_eq!(audio.cues, vec![AudioCue::PickupCoin, AudioCue::PickupTrash]);
    }
}
