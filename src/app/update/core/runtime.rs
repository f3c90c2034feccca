use super::super::super::messages::Message;
use super::super::super::state::{App, LoadTicket};
use super::super::Effect;
use crate::cancellation::CancellationToken;
use crate::extract::load_document;
use crate::playback::{PlaybackEffect, Utterance};
use iced::Event;
use iced::Task;
use iced::event;
use iced::futures::channel::oneshot;
use iced::keyboard;
use iced::window;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Run `job` on its own thread and deliver its message back to `update`.
fn spawn_blocking<F>(label: &'static str, job: F) -> Task<Message>
where
    F: FnOnce() -> Message + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name(format!("lectern-{label}"))
        .spawn(move || {
            let _ = tx.send(job());
        });
    if let Err(err) = spawned {
        warn!(label, "Failed to spawn worker thread: {err}");
        return Task::none();
    }
    Task::perform(rx, |result| result.ok()).and_then(Task::done)
}

impl App {
    pub(in crate::app) fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::Playback(effect) => self.run_playback_effect(effect),
            Effect::LoadDocument(path) => self.start_load(path),
            Effect::LoadVoices => {
                let backend = Arc::clone(&self.backend);
                spawn_blocking("voices", move || {
                    Message::VoicesLoaded(backend.voices().map_err(|err| format!("{err:#}")))
                })
            }
            Effect::WatchPlayback => self.watch_playback(),
            Effect::SaveBookmark => {
                self.persist_bookmark();
                Task::none()
            }
            Effect::QuitSafely => {
                if let Some(ticket) = self.loading.take() {
                    ticket.cancel.cancel();
                }
                let closing: Vec<_> = self
                    .session
                    .close()
                    .into_iter()
                    .map(|effect| self.run_playback_effect(effect))
                    .collect();
                info!("Quitting");
                Task::batch(closing).chain(iced::exit())
            }
        }
    }

    fn run_playback_effect(&mut self, effect: PlaybackEffect) -> Task<Message> {
        match effect {
            PlaybackEffect::ShowPage(index) => {
                debug!(page = index + 1, "Showing page");
                self.refresh_page_view();
                Task::none()
            }
            PlaybackEffect::Speak(utterance) => {
                self.stop_sink();
                self.notice = None;
                self.synthesize(utterance)
            }
            PlaybackEffect::PauseSpeech => {
                if let Some(playback) = &self.playback {
                    playback.sink.pause();
                }
                Task::none()
            }
            PlaybackEffect::ResumeSpeech => {
                if let Some(playback) = &self.playback {
                    playback.sink.play();
                }
                Task::none()
            }
            PlaybackEffect::CancelSpeech => {
                self.stop_sink();
                Task::none()
            }
        }
    }

    fn synthesize(&self, utterance: Utterance) -> Task<Message> {
        let backend = Arc::clone(&self.backend);
        let id = utterance.id;
        spawn_blocking("synth", move || match backend.synthesize(&utterance) {
            Ok(clip) => Message::UtteranceSynthesized { id, clip },
            Err(err) => Message::UtteranceFailed {
                id,
                error: format!("{err:#}"),
            },
        })
    }

    /// Watch the sink that just started and report when it runs dry.
    fn watch_playback(&self) -> Task<Message> {
        let Some(playback) = &self.playback else {
            return Task::none();
        };
        let sink = Arc::clone(&playback.sink);
        let id = playback.id;
        spawn_blocking("playback", move || {
            sink.sleep_until_end();
            Message::UtteranceFinished(id)
        })
    }

    fn start_load(&mut self, path: PathBuf) -> Task<Message> {
        if let Some(previous) = self.loading.take() {
            debug!(load_id = previous.id, "Cancelling superseded load");
            previous.cancel.cancel();
        }
        self.load_seq = self.load_seq.wrapping_add(1);
        let load_id = self.load_seq;
        let cancel = CancellationToken::new();
        self.loading = Some(LoadTicket {
            id: load_id,
            path: path.clone(),
            cancel: cancel.clone(),
        });
        self.notice = None;
        info!(load_id, path = %path.display(), "Loading document");

        spawn_blocking("load", move || match load_document(&path, Some(&cancel)) {
            Ok(Some(document)) => Message::DocumentLoaded { load_id, document },
            Ok(None) => Message::DocumentUnsupported { load_id, path },
            Err(err) => Message::DocumentLoadFailed {
                load_id,
                path,
                error: format!("{err:#}"),
            },
        })
    }

    fn persist_bookmark(&mut self) {
        let Some(store) = &self.bookmarks else {
            return;
        };
        let page = self.session.current_page();
        match store.save(page) {
            Ok(()) => {
                info!(page = page + 1, "Saved bookmark");
                self.notice = Some(format!("Bookmarked page {}", page + 1));
            }
            Err(err) => warn!(path = %store.path().display(), "Failed to save bookmark: {err:#}"),
        }
    }
}

pub(super) fn runtime_event_to_message(
    event: Event,
    status: event::Status,
    _window_id: window::Id,
) -> Option<Message> {
    if status == event::Status::Captured {
        return None;
    }
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            Some(Message::KeyPressed { key, modifiers })
        }
        _ => None,
    }
}
