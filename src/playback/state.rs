use crate::cancellation::CancellationToken;
use std::fmt;

/// Slowest speech rate accepted by the session.
pub const MIN_RATE: f32 = 0.1;
/// Fastest speech rate accepted by the session.
pub const MAX_RATE: f32 = 10.0;
/// Rate used when nothing else is configured.
pub const DEFAULT_RATE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Speaking,
    Paused,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackPhase::Idle => "Idle",
            PlaybackPhase::Speaking => "Speaking",
            PlaybackPhase::Paused => "Paused",
        };
        write!(f, "{label}")
    }
}

/// Name of a synthesis voice, resolved by the active speech backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceRef(String);

impl VoiceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Voice and rate carried from one document to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackParams {
    pub voice: Option<VoiceRef>,
    pub rate: f32,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            voice: None,
            rate: DEFAULT_RATE,
        }
    }
}

/// Mutable playback position and speech parameters for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_page: usize,
    pub phase: PlaybackPhase,
    pub voice: Option<VoiceRef>,
    pub rate: f32,
}

impl PlaybackState {
    pub(super) fn new(params: PlaybackParams) -> Self {
        Self {
            current_page: 0,
            phase: PlaybackPhase::Idle,
            voice: params.voice,
            rate: params.rate,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == PlaybackPhase::Paused
    }

    pub fn params(&self) -> PlaybackParams {
        PlaybackParams {
            voice: self.voice.clone(),
            rate: self.rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub(super) u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an utterance is reading; only page reads continue to the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOrigin {
    Page(usize),
    Selection,
}

/// One speech request handed to the synthesis backend.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub voice: Option<VoiceRef>,
    pub rate: f32,
    pub origin: UtteranceOrigin,
    /// Fired when the session supersedes or cancels this utterance.
    pub cancel: CancellationToken,
}

/// Work the host must carry out, in order, after a session operation.
#[derive(Debug, Clone)]
pub enum PlaybackEffect {
    ShowPage(usize),
    Speak(Utterance),
    PauseSpeech,
    ResumeSpeech,
    CancelSpeech,
}

/// Clamp a requested rate, rejecting values that cannot be spoken at all.
pub fn sanitize_rate(rate: f32) -> Option<f32> {
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    Some(rate.clamp(MIN_RATE, MAX_RATE))
}
