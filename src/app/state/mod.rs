use crate::bookmark::BookmarkStore;
use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::playback::{PlaybackParams, PlaybackSession, UtteranceId, VoiceRef};
use crate::speech::{AudioPlayer, SpeechBackend, Voice};
use iced::widget::text_editor;
use rodio::Sink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub(crate) const MIN_FONT_SIZE: u32 = 12;
pub(crate) const MAX_FONT_SIZE: u32 = 48;
pub(crate) const MIN_VOLUME: f32 = 0.0;
pub(crate) const MAX_VOLUME: f32 = 1.0;

/// A document load in flight. Results carrying another id are stale.
pub(in crate::app) struct LoadTicket {
    pub(in crate::app) id: u64,
    pub(in crate::app) path: PathBuf,
    pub(in crate::app) cancel: CancellationToken,
}

/// The sink currently playing (or holding) an utterance's audio.
pub(in crate::app) struct ActivePlayback {
    pub(in crate::app) id: UtteranceId,
    pub(in crate::app) sink: Arc<Sink>,
}

/// Application state: the playback session plus everything the UI and the
/// audio side need around it.
pub struct App {
    pub(super) config: AppConfig,
    pub(super) session: PlaybackSession,
    pub(super) page_view: text_editor::Content,
    pub(super) open_path_input: String,
    pub(super) loading: Option<LoadTicket>,
    pub(super) load_seq: u64,
    pub(super) notice: Option<String>,
    pub(super) voices: Vec<Voice>,
    pub(super) backend: Arc<dyn SpeechBackend>,
    pub(super) player: Option<AudioPlayer>,
    pub(super) playback: Option<ActivePlayback>,
    pub(super) bookmarks: Option<BookmarkStore>,
    pub(super) volume: f32,
}

impl App {
    pub(crate) fn new(
        config: AppConfig,
        backend: Arc<dyn SpeechBackend>,
        player: Option<AudioPlayer>,
    ) -> Self {
        let params = PlaybackParams {
            voice: config.tts_voice.clone().map(VoiceRef::new),
            rate: config.tts_rate,
        };
        let bookmarks = config
            .bookmarks
            .then(|| BookmarkStore::in_dir(Path::new(&config.cache_dir)));
        let volume = config.tts_volume.clamp(MIN_VOLUME, MAX_VOLUME);
        Self {
            session: PlaybackSession::empty(params),
            page_view: text_editor::Content::new(),
            open_path_input: String::new(),
            loading: None,
            load_seq: 0,
            notice: None,
            voices: Vec::new(),
            backend,
            player,
            playback: None,
            bookmarks,
            volume,
            config,
        }
    }

    pub fn title(&self) -> String {
        let title = self.session.document().title();
        if title.is_empty() {
            "Lectern".to_string()
        } else {
            format!("{title} - Lectern")
        }
    }

    /// Re-render the page area from the session's current page.
    pub(super) fn refresh_page_view(&mut self) {
        let text = self.session.current_page_text().unwrap_or("");
        self.page_view = text_editor::Content::with_text(text);
    }

    /// Stop and forget the active sink, if any.
    pub(super) fn stop_sink(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.sink.stop();
        }
    }

    pub(super) fn selected_voice(&self) -> Option<Voice> {
        let name = self.session.state().voice.as_ref()?.name().to_string();
        self.voices.iter().find(|voice| voice.name == name).cloned()
    }

    pub(super) fn report(&mut self, notice: impl Into<String>) {
        let notice = notice.into();
        warn!("{notice}");
        self.notice = Some(notice);
    }
}
