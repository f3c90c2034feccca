use crate::document::Document;
use crate::playback::UtteranceId;
use crate::speech::{AudioClip, Voice};
use iced::keyboard::{Key, Modifiers};
use iced::widget::text_editor;
use std::path::PathBuf;

/// Messages emitted by the UI and by background work.
#[derive(Debug, Clone)]
pub enum Message {
    OpenPathInputChanged(String),
    OpenPathRequested,
    DocumentLoaded {
        load_id: u64,
        document: Document,
    },
    DocumentUnsupported {
        load_id: u64,
        path: PathBuf,
    },
    DocumentLoadFailed {
        load_id: u64,
        path: PathBuf,
        error: String,
    },
    VoicesLoaded(Result<Vec<Voice>, String>),
    PageEditorAction(text_editor::Action),
    Read,
    TogglePause,
    Sync,
    Stop,
    NextPage,
    PreviousPage,
    Seek(i64),
    SetRate(f32),
    SetVolume(f32),
    VoiceSelected(Voice),
    SaveBookmark,
    ToggleTheme,
    FontSizeChanged(u32),
    UtteranceSynthesized {
        id: UtteranceId,
        clip: AudioClip,
    },
    UtteranceFailed {
        id: UtteranceId,
        error: String,
    },
    UtteranceFinished(UtteranceId),
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
    },
    SafeQuit,
}
