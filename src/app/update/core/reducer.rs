use super::super::super::messages::Message;
use super::super::super::state::{
    ActivePlayback, App, MAX_FONT_SIZE, MAX_VOLUME, MIN_FONT_SIZE, MIN_VOLUME,
};
use super::super::Effect;
use crate::bookmark::resolve_start_page;
use crate::document::Document;
use crate::playback::{UtteranceId, VoiceRef};
use crate::speech::{AudioClip, Voice};
use iced::widget::text_editor;
use std::path::PathBuf;
use tracing::{debug, info, warn};

impl App {
    pub(super) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::OpenPathInputChanged(path) => self.open_path_input = path,
            Message::OpenPathRequested => self.handle_open_path_requested(&mut effects),
            Message::DocumentLoaded { load_id, document } => {
                self.handle_document_loaded(load_id, document, &mut effects)
            }
            Message::DocumentUnsupported { load_id, path } => {
                self.handle_document_unsupported(load_id, path)
            }
            Message::DocumentLoadFailed {
                load_id,
                path,
                error,
            } => self.handle_document_load_failed(load_id, path, error),
            Message::VoicesLoaded(result) => self.handle_voices_loaded(result),
            Message::PageEditorAction(action) => self.handle_page_editor_action(action),
            Message::Read => {
                let selection = self.page_view.selection();
                effects.extend(Effect::from_playback(self.session.read(selection.as_deref())));
            }
            Message::TogglePause => {
                effects.extend(Effect::from_playback(self.session.toggle_pause()))
            }
            Message::Sync => effects.extend(Effect::from_playback(self.session.sync())),
            Message::Stop => effects.extend(Effect::from_playback(self.session.cancel())),
            Message::NextPage => effects.extend(Effect::from_playback(self.session.next_page())),
            Message::PreviousPage => {
                effects.extend(Effect::from_playback(self.session.previous_page()))
            }
            Message::Seek(raw) => effects.extend(Effect::from_playback(self.session.seek(raw))),
            Message::SetRate(rate) => {
                effects.extend(Effect::from_playback(self.session.set_rate(rate)))
            }
            Message::SetVolume(volume) => self.handle_set_volume(volume),
            Message::VoiceSelected(voice) => {
                let voice = VoiceRef::new(voice.name);
                effects.extend(Effect::from_playback(self.session.set_voice(Some(voice))));
            }
            Message::SaveBookmark => {
                if self.bookmarks.is_some() && self.session.page_count() > 0 {
                    effects.push(Effect::SaveBookmark);
                }
            }
            Message::ToggleTheme => {
                self.config.theme = self.config.theme.toggled();
                info!(theme = %self.config.theme, "Toggled theme");
            }
            Message::FontSizeChanged(size) => {
                self.config.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            }
            Message::UtteranceSynthesized { id, clip } => {
                self.handle_utterance_synthesized(id, clip, &mut effects)
            }
            Message::UtteranceFailed { id, error } => self.handle_utterance_failed(id, error),
            Message::UtteranceFinished(id) => self.handle_utterance_finished(id, &mut effects),
            Message::KeyPressed { key, modifiers } => {
                if let Some(shortcut) = self.shortcut_message_for_key(key, modifiers) {
                    effects.extend(self.reduce(shortcut));
                }
            }
            Message::SafeQuit => effects.push(Effect::QuitSafely),
        }

        effects
    }

    fn handle_open_path_requested(&mut self, effects: &mut Vec<Effect>) {
        let raw = self.open_path_input.trim();
        if raw.is_empty() {
            return;
        }
        effects.push(Effect::LoadDocument(PathBuf::from(raw)));
    }

    fn is_current_load(&self, load_id: u64) -> bool {
        self.loading
            .as_ref()
            .is_some_and(|ticket| ticket.id == load_id)
    }

    fn handle_document_loaded(
        &mut self,
        load_id: u64,
        document: Document,
        effects: &mut Vec<Effect>,
    ) {
        if !self.is_current_load(load_id) {
            debug!(load_id, "Dropping result of superseded load");
            return;
        }
        let Some(ticket) = self.loading.take() else {
            return;
        };
        info!(path = %ticket.path.display(), "Document ready");

        effects.extend(Effect::from_playback(
            self.session
                .open_document(document, self.config.words_per_page),
        ));

        let bookmark = self.bookmarks.as_ref().and_then(|store| store.load());
        let start = resolve_start_page(bookmark, self.session.page_count());
        if start > 0 {
            info!(page = start + 1, "Resuming from bookmark");
            effects.extend(Effect::from_playback(self.session.go_to_page(start)));
        }
        self.refresh_page_view();
        self.notice = None;
    }

    fn handle_document_unsupported(&mut self, load_id: u64, path: PathBuf) {
        if !self.is_current_load(load_id) {
            return;
        }
        self.loading = None;
        self.report(format!(
            "Unsupported file type: {} (expected .txt or .pdf)",
            path.display()
        ));
    }

    fn handle_document_load_failed(&mut self, load_id: u64, path: PathBuf, error: String) {
        if !self.is_current_load(load_id) {
            debug!(load_id, "Dropping failure of superseded load");
            return;
        }
        self.loading = None;
        self.report(format!("Could not open {}: {error}", path.display()));
    }

    fn handle_voices_loaded(&mut self, result: Result<Vec<Voice>, String>) {
        match result {
            Ok(voices) => {
                info!(count = voices.len(), backend = self.backend.name(), "Voices loaded");
                if let Some(wanted) = self.session.state().voice.as_ref() {
                    if !voices.iter().any(|voice| voice.name == wanted.name()) {
                        warn!(voice = %wanted, "Configured voice is not offered by the backend");
                    }
                }
                self.voices = voices;
            }
            Err(error) => self.report(format!("Could not list voices: {error}")),
        }
    }

    /// The page view is read-only; only cursor and selection actions apply.
    fn handle_page_editor_action(&mut self, action: text_editor::Action) {
        if action.is_edit() {
            return;
        }
        self.page_view.perform(action);
    }

    fn handle_set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        if let Some(playback) = &self.playback {
            playback.sink.set_volume(self.volume);
        }
    }

    fn handle_utterance_synthesized(
        &mut self,
        id: UtteranceId,
        clip: AudioClip,
        effects: &mut Vec<Effect>,
    ) {
        if !self.session.is_active(id) {
            debug!(id = %id, "Dropping audio for superseded utterance");
            return;
        }
        let Some(player) = &self.player else {
            self.session.on_utterance_failed(id);
            self.report("No audio output device available");
            return;
        };
        let paused = self.session.state().is_paused();
        match player.start(&clip, paused, self.volume) {
            Ok(sink) => {
                self.stop_sink();
                self.playback = Some(ActivePlayback { id, sink });
                effects.push(Effect::WatchPlayback);
            }
            Err(err) => {
                self.session.on_utterance_failed(id);
                self.report(format!("Playback failed: {err:#}"));
            }
        }
    }

    fn handle_utterance_failed(&mut self, id: UtteranceId, error: String) {
        if self.session.on_utterance_failed(id) {
            self.report(format!("Speech failed: {error}"));
        } else {
            debug!(id = %id, "Ignoring failure of superseded utterance: {error}");
        }
    }

    fn handle_utterance_finished(&mut self, id: UtteranceId, effects: &mut Vec<Effect>) {
        if self.playback.as_ref().is_some_and(|playback| playback.id == id) {
            self.playback = None;
        }
        effects.extend(Effect::from_playback(self.session.on_utterance_finished(id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::LoadTicket;
    use crate::cancellation::CancellationToken;
    use crate::config::AppConfig;
    use crate::playback::{PlaybackEffect, PlaybackPhase, Utterance};
    use crate::speech::SpeechBackend;
    use anyhow::{Result, bail};
    use std::sync::Arc;

    struct SilentBackend;

    impl SpeechBackend for SilentBackend {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn voices(&self) -> Result<Vec<Voice>> {
            Ok(vec![Voice::new("calm", "test"), Voice::new("bright", "test")])
        }

        fn synthesize(&self, _utterance: &Utterance) -> Result<AudioClip> {
            bail!("silent backend never speaks")
        }
    }

    fn app() -> App {
        let mut config = AppConfig::default();
        config.bookmarks = false;
        config.words_per_page = 10;
        App::new(config, Arc::new(SilentBackend), None)
    }

    fn words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn start_load(app: &mut App) -> u64 {
        app.load_seq += 1;
        app.loading = Some(LoadTicket {
            id: app.load_seq,
            path: PathBuf::from("book.txt"),
            cancel: CancellationToken::new(),
        });
        app.load_seq
    }

    fn open(app: &mut App, text: &str) {
        let load_id = start_load(app);
        app.reduce(Message::DocumentLoaded {
            load_id,
            document: Document::new("book.txt", text),
        });
    }

    fn spoken(effects: &[Effect]) -> Option<&Utterance> {
        effects.iter().find_map(|effect| match effect {
            Effect::Playback(PlaybackEffect::Speak(utterance)) => Some(utterance),
            _ => None,
        })
    }

    #[test]
    fn loaded_document_replaces_session_and_page_view() {
        let mut app = app();
        open(&mut app, &words(25));

        assert_eq!(app.session.page_count(), 3);
        assert_eq!(app.session.current_page(), 0);
        assert!(app.loading.is_none());
        assert!(app.page_view.text().starts_with("w0 w1"));
        assert_eq!(app.title(), "book.txt - Lectern");
    }

    #[test]
    fn stale_load_results_are_dropped() {
        let mut app = app();
        open(&mut app, &words(25));
        let stale = start_load(&mut app);
        let current = start_load(&mut app);

        app.reduce(Message::DocumentLoaded {
            load_id: stale,
            document: Document::new("other.txt", "short"),
        });
        assert_eq!(app.session.page_count(), 3);
        assert!(app.loading.is_some());

        app.reduce(Message::DocumentLoadFailed {
            load_id: current,
            path: PathBuf::from("broken.pdf"),
            error: "bad xref".to_string(),
        });
        assert_eq!(app.session.page_count(), 3);
        assert!(app.loading.is_none());
        assert!(app.notice.as_deref().unwrap_or("").contains("bad xref"));
    }

    #[test]
    fn unsupported_file_leaves_state_untouched() {
        let mut app = app();
        open(&mut app, &words(25));
        app.reduce(Message::NextPage);
        let load_id = start_load(&mut app);

        app.reduce(Message::DocumentUnsupported {
            load_id,
            path: PathBuf::from("book.epub"),
        });

        assert_eq!(app.session.current_page(), 1);
        assert!(app.notice.is_some());
    }

    #[test]
    fn read_then_finish_advances_to_next_page() {
        let mut app = app();
        open(&mut app, &words(25));

        let effects = app.reduce(Message::Read);
        let first = spoken(&effects).unwrap().id;

        let effects = app.reduce(Message::UtteranceFinished(first));
        assert!(matches!(
            effects.first(),
            Some(Effect::Playback(PlaybackEffect::ShowPage(1)))
        ));
        let next = spoken(&effects).unwrap();
        assert!(next.text.starts_with("w10 w11"));
        assert!(next.text.ends_with("w19"));
        assert_eq!(app.session.current_page(), 1);
    }

    #[test]
    fn synthesis_failure_reports_and_returns_to_idle() {
        let mut app = app();
        open(&mut app, &words(5));
        let effects = app.reduce(Message::Read);
        let id = spoken(&effects).unwrap().id;

        app.reduce(Message::UtteranceFailed {
            id,
            error: "HTTP 401".to_string(),
        });

        assert_eq!(app.session.phase(), PlaybackPhase::Idle);
        assert!(app.notice.as_deref().unwrap_or("").contains("HTTP 401"));
    }

    #[test]
    fn audio_for_superseded_utterance_is_dropped() {
        let mut app = app();
        open(&mut app, &words(5));
        let first = spoken(&app.reduce(Message::Read)).unwrap().id;
        app.reduce(Message::Sync);

        app.reduce(Message::UtteranceSynthesized {
            id: first,
            clip: AudioClip::Encoded(vec![1, 2, 3]),
        });

        assert!(app.playback.is_none());
        assert!(app.notice.is_none());
        assert_eq!(app.session.phase(), PlaybackPhase::Speaking);
    }

    #[test]
    fn late_events_from_previous_document_are_ignored() {
        let mut app = app();
        open(&mut app, &words(5));
        let from_first = spoken(&app.reduce(Message::Read)).unwrap().id;

        open(&mut app, &words(15));
        let from_second = spoken(&app.reduce(Message::Read)).unwrap().id;
        assert_ne!(from_first, from_second);

        app.reduce(Message::UtteranceFailed {
            id: from_first,
            error: "request cancelled".to_string(),
        });
        app.reduce(Message::UtteranceSynthesized {
            id: from_first,
            clip: AudioClip::Encoded(vec![1, 2, 3]),
        });

        assert_eq!(app.session.phase(), PlaybackPhase::Speaking);
        assert!(app.session.is_active(from_second));
        assert!(app.notice.is_none());
    }

    #[test]
    fn missing_audio_device_fails_the_utterance() {
        let mut app = app();
        open(&mut app, &words(5));
        let id = spoken(&app.reduce(Message::Read)).unwrap().id;

        app.reduce(Message::UtteranceSynthesized {
            id,
            clip: AudioClip::Encoded(vec![1, 2, 3]),
        });

        assert_eq!(app.session.phase(), PlaybackPhase::Idle);
        assert!(app.notice.is_some());
    }

    #[test]
    fn voice_selection_restarts_active_reading() {
        let mut app = app();
        open(&mut app, &words(5));
        app.reduce(Message::VoicesLoaded(Ok(vec![Voice::new("calm", "test")])));
        app.reduce(Message::Read);

        let effects = app.reduce(Message::VoiceSelected(Voice::new("calm", "test")));

        assert_eq!(
            spoken(&effects).unwrap().voice.as_ref().map(VoiceRef::name),
            Some("calm")
        );
        assert_eq!(app.selected_voice().map(|voice| voice.name), Some("calm".to_string()));
    }

    #[test]
    fn bookmark_requests_need_an_enabled_store_and_pages() {
        let mut app = app();
        open(&mut app, &words(5));
        assert!(app.reduce(Message::SaveBookmark).is_empty());

        let mut config = AppConfig::default();
        config.cache_dir = std::env::temp_dir().display().to_string();
        let mut enabled = App::new(config, Arc::new(SilentBackend), None);
        assert!(enabled.reduce(Message::SaveBookmark).is_empty());
    }

    #[test]
    fn read_only_page_view_ignores_edits() {
        let mut app = app();
        open(&mut app, "alpha beta");
        let before = app.page_view.text();

        app.reduce(Message::PageEditorAction(text_editor::Action::Edit(
            text_editor::Edit::Insert('x'),
        )));

        assert_eq!(app.page_view.text(), before);
    }

    #[test]
    fn volume_and_font_size_are_clamped() {
        let mut app = app();
        app.reduce(Message::SetVolume(4.0));
        app.reduce(Message::FontSizeChanged(500));
        assert_eq!(app.volume, MAX_VOLUME);
        assert_eq!(app.config.font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn open_path_request_ignores_blank_input() {
        let mut app = app();
        app.reduce(Message::OpenPathInputChanged("   ".to_string()));
        assert!(app.reduce(Message::OpenPathRequested).is_empty());

        app.reduce(Message::OpenPathInputChanged(" notes.txt ".to_string()));
        let effects = app.reduce(Message::OpenPathRequested);
        assert!(matches!(
            effects.as_slice(),
            [Effect::LoadDocument(path)] if path == &PathBuf::from("notes.txt")
        ));
    }
}
