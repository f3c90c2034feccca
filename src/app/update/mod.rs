use crate::playback::PlaybackEffect;
use std::path::PathBuf;

mod core;

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug)]
pub(super) enum Effect {
    Playback(PlaybackEffect),
    LoadDocument(PathBuf),
    LoadVoices,
    /// Wait for the active sink to drain, then report the utterance finished.
    WatchPlayback,
    SaveBookmark,
    QuitSafely,
}

impl Effect {
    pub(super) fn from_playback(effects: Vec<PlaybackEffect>) -> impl Iterator<Item = Effect> {
        effects.into_iter().map(Effect::Playback)
    }
}
