//! Pagination-aware playback state machine.
//!
//! A [`PlaybackSession`] owns the open document, its pages and the playback
//! state. User actions and speech lifecycle events go in; ordered
//! [`PlaybackEffect`]s come out for the app to execute.

mod session;
mod state;

pub use session::PlaybackSession;
pub use state::{
    DEFAULT_RATE, MAX_RATE, MIN_RATE, PlaybackEffect, PlaybackParams, PlaybackPhase,
    PlaybackState, Utterance, UtteranceId, UtteranceOrigin, VoiceRef, sanitize_rate,
};
