use std::{collections::HashMap, io::Cursor, sync::Arc};

use rodio::{decoder::DecoderError, Decoder, OutputStream, OutputStreamHandle, PlayError, Sink, Source};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("sound {0:?} not found")]
    SoundNotFound(String),
    #[error("music {0:?} not found")]
    MusicNotFound(String),
    #[error("unsupported audio format for {0:?} (expected .wav, .mp3 or .ogg)")]
    UnsupportedFormat(String),
    #[error("failed to decode {name:?}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecoderError,
    },
    #[error("calculated volume for {0:?} is zero")]
    ZeroVolume(String),
    #[error("audio output device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to create audio sink: {0}")]
    Sink(#[from] PlayError),
}

/// Volume settings; the effective volume is the product of master, channel
/// and per-call volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioProps {
    pub master_volume: f32,
    pub music_volume: f32,
    pub sound_volume: f32,
}

impl Default for AudioProps {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.7,
            sound_volume: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
}

impl AudioFormat {
    fn from_name(name: &str) -> Result<Self, AudioError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "ogg" => Ok(AudioFormat::Ogg),
            _ => Err(AudioError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Encoded clip kept in memory; decoded again for every playback.
#[derive(Clone)]
struct Clip {
    format: AudioFormat,
    bytes: Arc<[u8]>,
}

impl Clip {
    fn decode(&self, name: &str) -> Result<Decoder<Cursor<Arc<[u8]>>>, AudioError> {
        let cursor = Cursor::new(Arc::clone(&self.bytes));
        let decoded = match self.format {
            AudioFormat::Wav => Decoder::new_wav(cursor),
            AudioFormat::Mp3 => Decoder::new_mp3(cursor),
            AudioFormat::Ogg => Decoder::new_vorbis(cursor),
        };
        decoded.map_err(|source| AudioError::Decode {
            name: name.to_string(),
            source,
        })
    }
}

struct Output {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// Named sound effects and music over rodio.
///
/// Without an output device the manager runs silent: loading and validation
/// behave the same, playback is skipped.
pub struct AudioManager {
    output: Option<Output>,
    props: AudioProps,
    sounds: HashMap<String, Clip>,
    music: HashMap<String, Clip>,
    sound_sinks: Vec<Sink>,
    music_sink: Option<Sink>,
    current_music: Option<String>,
}

impl AudioManager {
    /// Open the default output device, falling back to silent mode.
    pub fn new(props: AudioProps) -> Self {
        match Self::try_default(props) {
            Ok(manager) => manager,
            Err(e) => {
                log::warn!("Failed to initialize audio: {}. Audio will be unavailable.", e);
                Self::silent(props)
            }
        }
    }

    /// Open the default output device or fail.
    pub fn try_default(props: AudioProps) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        let mut manager = Self::silent(props);
        manager.output = Some(Output {
            _stream: stream,
            handle,
        });
        Ok(manager)
    }

    /// A manager that never opens a device.
    pub fn silent(props: AudioProps) -> Self {
        Self {
            output: None,
            props,
            sounds: HashMap::new(),
            music: HashMap::new(),
            sound_sinks: Vec::new(),
            music_sink: None,
            current_music: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.output.is_some()
    }

    pub fn props(&self) -> AudioProps {
        self.props
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.props.master_volume = volume.max(0.0);
        self.apply_music_volume();
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.props.music_volume = volume.max(0.0);
        self.apply_music_volume();
    }

    pub fn set_sound_volume(&mut self, volume: f32) {
        self.props.sound_volume = volume.max(0.0);
    }

    /// Register a sound effect. The format comes from the name's extension.
    pub fn load_sound(&mut self, name: &str, bytes: impl Into<Arc<[u8]>>) -> Result<(), AudioError> {
        let clip = Self::load_clip(name, bytes.into())?;
        log::debug!("loaded sound {name}");
        self.sounds.insert(name.to_string(), clip);
        Ok(())
    }

    /// Register a music track. The format comes from the name's extension.
    pub fn load_music(&mut self, name: &str, bytes: impl Into<Arc<[u8]>>) -> Result<(), AudioError> {
        let clip = Self::load_clip(name, bytes.into())?;
        log::debug!("loaded music {name}");
        self.music.insert(name.to_string(), clip);
        Ok(())
    }

    fn load_clip(name: &str, bytes: Arc<[u8]>) -> Result<Clip, AudioError> {
        let clip = Clip {
            format: AudioFormat::from_name(name)?,
            bytes,
        };
        clip.decode(name)?;
        Ok(clip)
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains_key(name)
    }

    pub fn has_music(&self, name: &str) -> bool {
        self.music.contains_key(name)
    }

    pub fn play_sound(&mut self, name: &str) -> Result<(), AudioError> {
        self.play_sound_with_volume(name, 1.0)
    }

    /// Play a loaded sound once, scaled by `volume` on top of the configured
    /// volumes. Several sounds may overlap.
    pub fn play_sound_with_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        let clip = self
            .sounds
            .get(name)
            .ok_or_else(|| AudioError::SoundNotFound(name.to_string()))?;
        let volume = self.props.master_volume * self.props.sound_volume * volume;
        if volume <= 0.0 {
            return Err(AudioError::ZeroVolume(name.to_string()));
        }
        let Some(output) = &self.output else {
            log::trace!("audio unavailable; skipping sound {name}");
            return Ok(());
        };

        let source = clip.decode(name)?;
        let sink = Sink::try_new(&output.handle)?;
        sink.set_volume(volume);
        sink.append(source);
        self.sound_sinks.push(sink);
        Ok(())
    }

    /// Replace the current track with `name`.
    pub fn play_music(&mut self, name: &str, looped: bool) -> Result<(), AudioError> {
        let clip = self
            .music
            .get(name)
            .ok_or_else(|| AudioError::MusicNotFound(name.to_string()))?;
        let volume = self.music_level();
        if volume <= 0.0 {
            return Err(AudioError::ZeroVolume(name.to_string()));
        }

        let source = clip.decode(name)?;
        self.stop_music();
        self.current_music = Some(name.to_string());

        let Some(output) = &self.output else {
            log::trace!("audio unavailable; skipping music {name}");
            return Ok(());
        };
        let sink = Sink::try_new(&output.handle)?;
        sink.set_volume(volume);
        if looped {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        self.music_sink = Some(sink);
        Ok(())
    }

    pub fn stop_music(&mut self) {
        if let Some(sink) = self.music_sink.take() {
            sink.stop();
        }
        self.current_music = None;
    }

    pub fn pause_music(&self) {
        if let Some(sink) = &self.music_sink {
            sink.pause();
        }
    }

    pub fn resume_music(&self) {
        if let Some(sink) = &self.music_sink {
            sink.play();
        }
    }

    /// Name of the track last started and not stopped since.
    pub fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    /// Number of sound effects still playing.
    pub fn active_sounds(&self) -> usize {
        self.sound_sinks.len()
    }

    /// Per-frame maintenance: drop sinks whose sound has finished.
    pub fn update(&mut self) {
        self.sound_sinks.retain(|sink| !sink.empty());
        if self.music_sink.as_ref().is_some_and(Sink::empty) {
            self.music_sink = None;
            self.current_music = None;
        }
    }

    /// Stop everything and forget loaded clips.
    pub fn cleanup(&mut self) {
        for sink in self.sound_sinks.drain(..) {
            sink.stop();
        }
        self.stop_music();
        self.sounds.clear();
        self.music.clear();
    }

    fn music_level(&self) -> f32 {
        self.props.master_volume * self.props.music_volume
    }

    fn apply_music_volume(&self) {
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.music_level());
        }
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent(AudioProps::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit mono PCM WAV of silence.
    fn wav_bytes() -> Vec<u8> {
        let data_len: u32 = 200;
        let mut v = Vec::new();
        v.extend(b"RIFF");
        v.extend(&(36 + data_len).to_le_bytes());
        v.extend(b"WAVE");
        v.extend(b"fmt ");
        v.extend(&16u32.to_le_bytes());
        v.extend(&1u16.to_le_bytes());
        v.extend(&1u16.to_le_bytes());
        v.extend(&8000u32.to_le_bytes());
        v.extend(&16000u32.to_le_bytes());
        v.extend(&2u16.to_le_bytes());
        v.extend(&16u16.to_le_bytes());
        v.extend(b"data");
        v.extend(&data_len.to_le_bytes());
        v.extend(std::iter::repeat(0u8).take(data_len as usize));
        v
    }

    #[test]
    fn default_volumes() {
        let props = AudioProps::default();
        assert_eq!(props.master_volume, 1.0);
        assert_eq!(props.music_volume, 0.7);
        assert_eq!(props.sound_volume, 0.8);
    }

    #[test]
    fn extension_selects_format() {
        assert_eq!(AudioFormat::from_name("jump.WAV").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_name("theme.mp3").unwrap(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_name("theme.ogg").unwrap(), AudioFormat::Ogg);
        assert!(matches!(
            AudioFormat::from_name("theme.flac"),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            AudioFormat::from_name("noext"),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        let mut audio = AudioManager::default();
        let err = audio.load_sound("bad.wav", vec![1u8, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, AudioError::Decode { .. }));
        assert!(!audio.has_sound("bad.wav"));
    }

    #[test]
    fn silent_playback_succeeds_after_validation() {
        let mut audio = AudioManager::default();
        audio.load_sound("jump.wav", wav_bytes()).unwrap();
        assert!(audio.has_sound("jump.wav"));
        audio.play_sound("jump.wav").unwrap();
        assert_eq!(audio.active_sounds(), 0);

        assert!(matches!(
            audio.play_sound("missing.wav"),
            Err(AudioError::SoundNotFound(_))
        ));
    }

    #[test]
    fn zero_volume_is_an_error() {
        let mut audio = AudioManager::default();
        audio.load_sound("jump.wav", wav_bytes()).unwrap();
        assert!(matches!(
            audio.play_sound_with_volume("jump.wav", 0.0),
            Err(AudioError::ZeroVolume(_))
        ));

        audio.load_music("theme.wav", wav_bytes()).unwrap();
        audio.set_master_volume(0.0);
        assert!(matches!(
            audio.play_music("theme.wav", true),
            Err(AudioError::ZeroVolume(_))
        ));
    }

    #[test]
    fn music_tracks_current_name() {
        let mut audio = AudioManager::default();
        audio.load_music("theme.wav", wav_bytes()).unwrap();
        audio.play_music("theme.wav", true).unwrap();
        assert_eq!(audio.current_music(), Some("theme.wav"));
        audio.stop_music();
        assert_eq!(audio.current_music(), None);

        assert!(matches!(
            audio.play_music("other.ogg", false),
            Err(AudioError::MusicNotFound(_))
        ));
    }
}
