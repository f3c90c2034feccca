//! Speech synthesis backends and audio playback.
//!
//! A [`SpeechBackend`] turns an [`Utterance`] into an [`AudioClip`]; the
//! [`AudioPlayer`] plays clips through `rodio`. Backends are blocking and are
//! always driven from worker threads.

mod piper;
mod player;
mod remote;

pub use piper::{PiperBackend, discover_piper_voices};
pub use player::AudioPlayer;
pub use remote::RemoteBackend;

use crate::config::{AppConfig, TtsBackendKind};
use crate::playback::Utterance;
use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A voice offered by the active backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// Where the voice comes from (model path, remote endpoint).
    pub origin: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Synthesized audio ready for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioClip {
    /// A decodable file on disk (cached WAV).
    File(PathBuf),
    /// An encoded stream held in memory (mp3, wav, flac, ogg).
    Encoded(Vec<u8>),
}

pub trait SpeechBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn voices(&self) -> Result<Vec<Voice>>;

    /// Blocking. Implementations check `utterance.cancel` and bail early once
    /// the utterance has been superseded.
    fn synthesize(&self, utterance: &Utterance) -> Result<AudioClip>;
}

pub fn backend_from_config(config: &AppConfig) -> Arc<dyn SpeechBackend> {
    match config.tts_backend {
        TtsBackendKind::Piper => Arc::new(PiperBackend::new(
            PathBuf::from(&config.tts_model_path),
            PathBuf::from(&config.tts_voices_dir),
            PathBuf::from(&config.tts_espeak_path),
            PathBuf::from(&config.cache_dir).join("tts"),
        )),
        TtsBackendKind::Remote => Arc::new(RemoteBackend::new(config.remote.clone())),
    }
}
