//! Audio mixing for sound effects and music
//!
//! States talk to a `Mixer` through channel numbers; sounds and music are
//! referenced by resource cache ids and are never owned by the mixer.

mod mixer;

pub use mixer::SoftMixer;

use crate::io::{MusicId, SoundId};
use thiserror::Error;

/// Number of sound effect channels
pub const CHANNELS: usize = 8;

/// How many times a sound or track repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loops {
    /// Play `n` times in total (at least once)
    Times(u32),
    Forever,
}

/// Errors raised by the mixer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("no free channel")]
    NoFreeChannel,
    #[error("no such channel {0}")]
    BadChannel(i64),
}

/// Sound effect and music playback
pub trait Mixer {
    /// Start `sound` on a free channel and return the channel
    fn play(&mut self, sound: SoundId, loops: Loops) -> Result<usize, AudioError>;

    /// Pause one channel, or every channel when `None`
    fn pause(&mut self, channel: Option<usize>);

    fn resume(&mut self, channel: Option<usize>);

    /// Stop one channel, or every channel when `None`
    fn halt(&mut self, channel: Option<usize>);

    /// Number of playing channels among the selected ones
    fn playing(&self, channel: Option<usize>) -> usize;

    /// Number of paused channels among the selected ones
    fn paused(&self, channel: Option<usize>) -> usize;

    /// Set the volume on a `0..=1` scale and return the previous volume
    ///
    /// A negative `volume` only queries. Without a channel, every channel is
    /// set and the average is returned.
    fn volume(&mut self, channel: Option<usize>, volume: f64) -> f64;

    fn play_music(&mut self, music: MusicId, loops: Loops);

    fn halt_music(&mut self);

    fn music_playing(&self) -> Option<MusicId>;

    /// Stop every channel and the music
    fn halt_all(&mut self) {
        self.halt(None);
        self.halt_music();
    }
}

/// Validate a script-supplied channel number
pub fn channel_index(channel: i64) -> Result<usize, AudioError> {
    if channel < 0 || channel as usize >= CHANNELS {
        return Err(AudioError::BadChannel(channel));
    }
    Ok(channel as usize)
}
