//! Channel-bookkeeping mixer without an output device

use super::{AudioError, Loops, Mixer, CHANNELS};
use crate::io::{MusicId, SoundId};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Voice {
    sound: SoundId,
    loops: Loops,
    paused: bool,
}

/// Mixer that tracks channel state so games run identically without audio
#[derive(Debug, Clone)]
pub struct SoftMixer {
    voices: [Option<Voice>; CHANNELS],
    volumes: [f64; CHANNELS],
    music: Option<(MusicId, Loops)>,
}

impl Default for SoftMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftMixer {
    pub fn new() -> Self {
        Self {
            voices: [None; CHANNELS],
            volumes: [1.0; CHANNELS],
            music: None,
        }
    }

    /// Sound currently assigned to `channel`
    pub fn voice(&self, channel: usize) -> Option<SoundId> {
        self.voices.get(channel)?.map(|voice| voice.sound)
    }

    fn selected(&self, channel: Option<usize>) -> Vec<usize> {
        match channel {
            Some(ch) if ch < CHANNELS => vec![ch],
            Some(_) => Vec::new(),
            None => (0..CHANNELS).collect(),
        }
    }
}

impl Mixer for SoftMixer {
    fn play(&mut self, sound: SoundId, loops: Loops) -> Result<usize, AudioError> {
        let channel = self
            .voices
            .iter()
            .position(Option::is_none)
            .ok_or(AudioError::NoFreeChannel)?;
        self.voices[channel] = Some(Voice {
            sound,
            loops,
            paused: false,
        });
        trace!(channel, ?sound, ?loops, "Playing sound");
        Ok(channel)
    }

    fn pause(&mut self, channel: Option<usize>) {
        for ch in self.selected(channel) {
            if let Some(voice) = self.voices[ch].as_mut() {
                voice.paused = true;
            }
        }
    }

    fn resume(&mut self, channel: Option<usize>) {
        for ch in self.selected(channel) {
            if let Some(voice) = self.voices[ch].as_mut() {
                voice.paused = false;
            }
        }
    }

    fn halt(&mut self, channel: Option<usize>) {
        for ch in self.selected(channel) {
            self.voices[ch] = None;
        }
    }

    fn playing(&self, channel: Option<usize>) -> usize {
        self.selected(channel)
            .into_iter()
            .filter(|ch| self.voices[*ch].is_some())
            .count()
    }

    fn paused(&self, channel: Option<usize>) -> usize {
        self.selected(channel)
            .into_iter()
            .filter(|ch| matches!(self.voices[*ch], Some(Voice { paused: true, .. })))
            .count()
    }

    fn volume(&mut self, channel: Option<usize>, volume: f64) -> f64 {
        let selected = self.selected(channel);
        if selected.is_empty() {
            return 0.0;
        }
        let previous =
            selected.iter().map(|ch| self.volumes[*ch]).sum::<f64>() / selected.len() as f64;
        if volume >= 0.0 {
            let volume = volume.min(1.0);
            for ch in selected {
                self.volumes[ch] = volume;
            }
        }
        previous
    }

    fn play_music(&mut self, music: MusicId, loops: Loops) {
        debug!(?music, ?loops, "Playing music");
        self.music = Some((music, loops));
    }

    fn halt_music(&mut self) {
        self.music = None;
    }

    fn music_playing(&self) -> Option<MusicId> {
        self.music.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemorySource, ResourceCache};

    fn ids() -> (SoundId, MusicId) {
        let source = MemorySource::new().with("a.wav", vec![0]).with("m.ogg", vec![1]);
        let mut cache = ResourceCache::new(Box::new(source));
        (
            cache.load_sound("a.wav").unwrap(),
            cache.load_music("m.ogg").unwrap(),
        )
    }

    #[test]
    fn test_channels_fill_and_free() {
        let (sound, _) = ids();
        let mut mixer = SoftMixer::new();
        for expected in 0..CHANNELS {
            assert_eq!(mixer.play(sound, Loops::Times(1)).unwrap(), expected);
        }
        assert_eq!(mixer.play(sound, Loops::Forever), Err(AudioError::NoFreeChannel));
        assert_eq!(mixer.playing(None), CHANNELS);

        mixer.halt(Some(3));
        assert_eq!(mixer.playing(Some(3)), 0);
        assert_eq!(mixer.play(sound, Loops::Forever).unwrap(), 3);
    }

    #[test]
    fn test_pause_resume() {
        let (sound, _) = ids();
        let mut mixer = SoftMixer::new();
        let ch = mixer.play(sound, Loops::Times(1)).unwrap();
        mixer.play(sound, Loops::Times(1)).unwrap();

        mixer.pause(Some(ch));
        assert_eq!(mixer.paused(None), 1);
        mixer.pause(None);
        assert_eq!(mixer.paused(None), 2);
        mixer.resume(None);
        assert_eq!(mixer.paused(None), 0);
        assert_eq!(mixer.playing(None), 2);
    }

    #[test]
    fn test_volume_query_and_set() {
        let mut mixer = SoftMixer::new();
        assert_eq!(mixer.volume(Some(0), -1.0), 1.0);
        assert_eq!(mixer.volume(Some(0), 0.5), 1.0);
        assert_eq!(mixer.volume(Some(0), -1.0), 0.5);
        assert_eq!(mixer.volume(None, 2.0), (0.5 + 7.0) / 8.0);
        assert_eq!(mixer.volume(Some(5), -1.0), 1.0);
    }

    #[test]
    fn test_halt_all_stops_music() {
        let (sound, music) = ids();
        let mut mixer = SoftMixer::new();
        mixer.play(sound, Loops::Forever).unwrap();
        mixer.play_music(music, Loops::Forever);
        assert_eq!(mixer.music_playing(), Some(music));

        mixer.halt_all();
        assert_eq!(mixer.playing(None), 0);
        assert_eq!(mixer.music_playing(), None);
    }
}
