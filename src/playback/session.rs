use super::state::{
    PlaybackEffect, PlaybackParams, PlaybackPhase, PlaybackState, Utterance, UtteranceId,
    UtteranceOrigin, VoiceRef, sanitize_rate,
};
use crate::cancellation::CancellationToken;
use crate::document::Document;
use crate::pagination::PageSet;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct ActiveUtterance {
    id: UtteranceId,
    origin: UtteranceOrigin,
    cancel: CancellationToken,
}

/// Playback state machine for one opened document.
///
/// Operations never talk to the speech backend or the renderer directly;
/// they return the effects the host has to run, in order.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    document: Document,
    pages: PageSet,
    state: PlaybackState,
    active: Option<ActiveUtterance>,
    utterance_seq: u64,
}

impl PlaybackSession {
    pub fn new(document: Document, page_size: usize, params: PlaybackParams) -> Self {
        let pages = PageSet::new(document.raw_text(), page_size);
        info!(
            title = %document.title(),
            words = document.word_count(),
            pages = pages.len(),
            "Opened playback session"
        );
        Self {
            document,
            pages,
            state: PlaybackState::new(params),
            active: None,
            utterance_seq: 0,
        }
    }

    /// Session with no document; every page operation is a no-op.
    pub fn empty(params: PlaybackParams) -> Self {
        Self {
            document: Document::default(),
            pages: PageSet::default(),
            state: PlaybackState::new(params),
            active: None,
            utterance_seq: 0,
        }
    }

    /// Swap in a new document, keeping voice, rate and the utterance counter.
    ///
    /// Ids keep increasing across documents, so a late completion for an
    /// utterance of the previous document can never match one of this one.
    pub fn open_document(&mut self, document: Document, page_size: usize) -> Vec<PlaybackEffect> {
        let effects = self.close();
        let pages = PageSet::new(document.raw_text(), page_size);
        info!(
            title = %document.title(),
            words = document.word_count(),
            pages = pages.len(),
            "Opened playback session"
        );
        self.state = PlaybackState::new(self.state.params());
        self.document = document;
        self.pages = pages;
        effects
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page_text(&self) -> Option<&str> {
        self.pages.get(self.state.current_page)
    }

    pub fn is_active(&self, id: UtteranceId) -> bool {
        self.active.as_ref().is_some_and(|active| active.id == id)
    }

    pub fn has_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    /// Upper bound of the seek control.
    pub fn last_page(&self) -> usize {
        self.pages.last_index()
    }

    #[cfg(test)]
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Display `index`, stopping whatever is being spoken.
    pub fn go_to_page(&mut self, index: usize) -> Vec<PlaybackEffect> {
        if !self.pages.contains(index) {
            debug!(
                index,
                pages = self.pages.len(),
                "Ignoring out-of-range page request"
            );
            return Vec::new();
        }
        let mut effects = self.stop_active();
        self.state.current_page = index;
        effects.push(PlaybackEffect::ShowPage(index));
        effects
    }

    /// Seek-control entry point; negative or out-of-range input is ignored.
    pub fn seek(&mut self, raw: i64) -> Vec<PlaybackEffect> {
        match self.pages.checked_index(raw) {
            Some(index) => self.go_to_page(index),
            None => {
                debug!(raw, "Ignoring seek outside the page range");
                Vec::new()
            }
        }
    }

    pub fn next_page(&mut self) -> Vec<PlaybackEffect> {
        self.go_to_page(self.state.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> Vec<PlaybackEffect> {
        match self.state.current_page.checked_sub(1) {
            Some(index) => self.go_to_page(index),
            None => Vec::new(),
        }
    }

    /// Speak page `index`, replacing any utterance in flight.
    pub fn read_page(&mut self, index: usize) -> Vec<PlaybackEffect> {
        let Some(text) = self.pages.get(index).map(str::to_string) else {
            debug!(
                index,
                pages = self.pages.len(),
                "Ignoring read of out-of-range page"
            );
            return Vec::new();
        };
        let mut effects = self.stop_active();
        let utterance = self.begin_utterance(text, UtteranceOrigin::Page(index));
        info!(
            page = index + 1,
            id = %utterance.id,
            rate = utterance.rate,
            voice = utterance.voice.as_ref().map(VoiceRef::name).unwrap_or("default"),
            "Reading page"
        );
        effects.push(PlaybackEffect::Speak(utterance));
        effects
    }

    /// Speak arbitrary text once, leaving the page position alone.
    pub fn read_selection(&mut self, text: &str) -> Vec<PlaybackEffect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let mut effects = self.stop_active();
        let utterance = self.begin_utterance(text.to_string(), UtteranceOrigin::Selection);
        info!(
            id = %utterance.id,
            chars = text.len(),
            "Reading selected text"
        );
        effects.push(PlaybackEffect::Speak(utterance));
        effects
    }

    /// Read button: the selection if there is one, otherwise the current page.
    pub fn read(&mut self, selection: Option<&str>) -> Vec<PlaybackEffect> {
        match selection.filter(|text| !text.trim().is_empty()) {
            Some(text) => self.read_selection(text),
            None => self.read_page(self.state.current_page),
        }
    }

    /// Restart reading at the displayed page.
    pub fn sync(&mut self) -> Vec<PlaybackEffect> {
        self.read_page(self.state.current_page)
    }

    pub fn pause(&mut self) -> Vec<PlaybackEffect> {
        if self.state.phase != PlaybackPhase::Speaking {
            return Vec::new();
        }
        self.state.phase = PlaybackPhase::Paused;
        debug!("Paused speech");
        vec![PlaybackEffect::PauseSpeech]
    }

    pub fn resume(&mut self) -> Vec<PlaybackEffect> {
        if self.state.phase != PlaybackPhase::Paused {
            return Vec::new();
        }
        self.state.phase = PlaybackPhase::Speaking;
        debug!("Resumed speech");
        vec![PlaybackEffect::ResumeSpeech]
    }

    pub fn toggle_pause(&mut self) -> Vec<PlaybackEffect> {
        match self.state.phase {
            PlaybackPhase::Speaking => self.pause(),
            PlaybackPhase::Paused => self.resume(),
            PlaybackPhase::Idle => Vec::new(),
        }
    }

    /// Stop speaking from any state. Calling it again is harmless.
    pub fn cancel(&mut self) -> Vec<PlaybackEffect> {
        self.stop_active()
    }

    /// Tear down before the session is replaced by another document.
    pub fn close(&mut self) -> Vec<PlaybackEffect> {
        self.stop_active()
    }

    pub fn set_rate(&mut self, rate: f32) -> Vec<PlaybackEffect> {
        let Some(rate) = sanitize_rate(rate) else {
            debug!(rate, "Ignoring invalid speech rate");
            return Vec::new();
        };
        if (rate - self.state.rate).abs() <= f32::EPSILON {
            return Vec::new();
        }
        self.state.rate = rate;
        info!(rate, "Adjusted speech rate");
        self.restart_if_speaking()
    }

    pub fn set_voice(&mut self, voice: Option<VoiceRef>) -> Vec<PlaybackEffect> {
        if voice == self.state.voice {
            return Vec::new();
        }
        info!(
            voice = voice.as_ref().map(VoiceRef::name).unwrap_or("default"),
            "Selected voice"
        );
        self.state.voice = voice;
        self.restart_if_speaking()
    }

    /// Natural end of an utterance. Drives the page-to-page reading loop.
    pub fn on_utterance_finished(&mut self, id: UtteranceId) -> Vec<PlaybackEffect> {
        let Some(finished) = self.take_if_active(id) else {
            debug!(id = %id, "Ignoring completion of superseded utterance");
            return Vec::new();
        };
        self.state.phase = PlaybackPhase::Idle;

        let UtteranceOrigin::Page(index) = finished.origin else {
            debug!(id = %id, "Selection finished");
            return Vec::new();
        };
        let next = index + 1;
        if !self.pages.contains(next) {
            info!(page = index + 1, "Finished reading the last page");
            return Vec::new();
        }
        if finished.cancel.is_cancelled() {
            return Vec::new();
        }

        info!(page = next + 1, "Page finished, advancing");
        let mut effects = self.go_to_page(next);
        effects.extend(self.read_page(next));
        effects
    }

    /// The backend could not produce or play audio for `id`.
    pub fn on_utterance_failed(&mut self, id: UtteranceId) -> bool {
        if self.take_if_active(id).is_none() {
            return false;
        }
        self.state.phase = PlaybackPhase::Idle;
        true
    }

    fn restart_if_speaking(&mut self) -> Vec<PlaybackEffect> {
        if self.state.phase == PlaybackPhase::Speaking {
            self.read_page(self.state.current_page)
        } else {
            Vec::new()
        }
    }

    fn begin_utterance(&mut self, text: String, origin: UtteranceOrigin) -> Utterance {
        self.utterance_seq = self.utterance_seq.wrapping_add(1);
        let id = UtteranceId(self.utterance_seq);
        let cancel = CancellationToken::new();
        self.active = Some(ActiveUtterance {
            id,
            origin,
            cancel: cancel.clone(),
        });
        self.state.phase = PlaybackPhase::Speaking;
        Utterance {
            id,
            text,
            voice: self.state.voice.clone(),
            rate: self.state.rate,
            origin,
            cancel,
        }
    }

    fn take_if_active(&mut self, id: UtteranceId) -> Option<ActiveUtterance> {
        if self.is_active(id) {
            self.active.take()
        } else {
            None
        }
    }

    fn stop_active(&mut self) -> Vec<PlaybackEffect> {
        self.state.phase = PlaybackPhase::Idle;
        match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                debug!(id = %active.id, "Cancelled active utterance");
                vec![PlaybackEffect::CancelSpeech]
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_pages(count: usize) -> PlaybackSession {
        let text = (0..count)
            .map(|page| format!("p{page}a p{page}b"))
            .collect::<Vec<_>>()
            .join(" ");
        PlaybackSession::new(
            Document::new("test.txt", text),
            2,
            PlaybackParams::default(),
        )
    }

    fn spoken(effects: &[PlaybackEffect]) -> Vec<Utterance> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                PlaybackEffect::Speak(utterance) => Some(utterance.clone()),
                _ => None,
            })
            .collect()
    }

    fn only_utterance(effects: &[PlaybackEffect]) -> Utterance {
        let mut utterances = spoken(effects);
        assert_eq!(utterances.len(), 1, "expected exactly one Speak effect");
        utterances.remove(0)
    }

    #[test]
    fn read_on_empty_document_is_a_noop() {
        let mut session = session_with_pages(0);
        let before = session.state().clone();
        assert!(!session.has_pages());
        assert_eq!(session.last_page(), 0);

        assert!(session.read_page(0).is_empty());
        assert!(session.sync().is_empty());
        assert!(session.read(None).is_empty());

        assert_eq!(session.state(), &before);
        assert_eq!(session.active_utterance(), None);
    }

    #[test]
    fn read_page_speaks_page_text_with_current_parameters() {
        let mut session = session_with_pages(2);
        session.set_voice(Some(VoiceRef::new("amy")));
        session.set_rate(1.5);

        let effects = session.read_page(1);
        let utterance = only_utterance(&effects);

        assert_eq!(utterance.text, "p1a p1b");
        assert_eq!(utterance.voice, Some(VoiceRef::new("amy")));
        assert!((utterance.rate - 1.5).abs() < f32::EPSILON);
        assert_eq!(utterance.origin, UtteranceOrigin::Page(1));
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
    }

    #[test]
    fn finishing_a_page_advances_display_before_next_read() {
        let mut session = session_with_pages(3);
        let first = only_utterance(&session.read_page(0));

        let effects = session.on_utterance_finished(first.id);

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], PlaybackEffect::ShowPage(1)));
        match &effects[1] {
            PlaybackEffect::Speak(next) => {
                assert_eq!(next.origin, UtteranceOrigin::Page(1));
                assert_eq!(next.text, "p1a p1b");
            }
            other => panic!("expected Speak, got {other:?}"),
        }
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
    }

    #[test]
    fn finishing_the_last_page_stops() {
        let mut session = session_with_pages(3);
        session.go_to_page(2);
        let last = only_utterance(&session.read_page(2));

        let effects = session.on_utterance_finished(last.id);

        assert!(effects.is_empty());
        assert_eq!(session.current_page(), 2);
        assert_eq!(session.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn reading_chain_walks_every_page_once() {
        let mut session = session_with_pages(3);
        let mut current = only_utterance(&session.read_page(0));
        let mut read = vec![current.origin];

        loop {
            let effects = session.on_utterance_finished(current.id);
            let next = spoken(&effects);
            match next.into_iter().next() {
                Some(utterance) => {
                    read.push(utterance.origin);
                    current = utterance;
                }
                None => break,
            }
        }

        assert_eq!(
            read,
            vec![
                UtteranceOrigin::Page(0),
                UtteranceOrigin::Page(1),
                UtteranceOrigin::Page(2)
            ]
        );
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut session = session_with_pages(3);
        let first = only_utterance(&session.read_page(0));
        let effects = session.read_page(0);
        assert!(matches!(effects[0], PlaybackEffect::CancelSpeech));
        let second = only_utterance(&effects);
        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        assert!(session.on_utterance_finished(first.id).is_empty());

        assert_eq!(session.current_page(), 0);
        assert!(session.is_active(second.id));
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
    }

    #[test]
    fn cancel_twice_stays_idle() {
        let mut session = session_with_pages(2);
        let utterance = only_utterance(&session.read_page(0));

        let first = session.cancel();
        assert!(matches!(first.as_slice(), [PlaybackEffect::CancelSpeech]));
        assert_eq!(session.phase(), PlaybackPhase::Idle);
        assert!(utterance.cancel.is_cancelled());

        assert!(session.cancel().is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Idle);

        assert!(session.on_utterance_finished(utterance.id).is_empty());
    }

    #[test]
    fn pause_then_resume_keeps_the_same_utterance() {
        let mut session = session_with_pages(2);
        let utterance = only_utterance(&session.read_page(0));

        assert!(matches!(
            session.pause().as_slice(),
            [PlaybackEffect::PauseSpeech]
        ));
        assert_eq!(session.phase(), PlaybackPhase::Paused);
        assert!(session.pause().is_empty());

        let effects = session.resume();
        assert!(matches!(effects.as_slice(), [PlaybackEffect::ResumeSpeech]));
        assert!(spoken(&effects).is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
        assert!(session.is_active(utterance.id));
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn pause_and_resume_are_noops_when_idle() {
        let mut session = session_with_pages(2);
        assert!(session.pause().is_empty());
        assert!(session.resume().is_empty());
        assert!(session.toggle_pause().is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn out_of_range_navigation_keeps_current_page() {
        let mut session = session_with_pages(3);
        session.go_to_page(1);

        assert!(session.seek(-1).is_empty());
        assert!(session.go_to_page(3).is_empty());
        assert!(session.seek(3).is_empty());

        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn seeking_cancels_speech_and_shows_page() {
        let mut session = session_with_pages(3);
        session.read_page(0);

        let effects = session.seek(2);

        assert!(matches!(
            effects.as_slice(),
            [PlaybackEffect::CancelSpeech, PlaybackEffect::ShowPage(2)]
        ));
        assert_eq!(session.phase(), PlaybackPhase::Idle);
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn selection_is_read_once_without_moving() {
        let mut session = session_with_pages(3);
        session.go_to_page(1);

        let selection = only_utterance(&session.read(Some("  highlighted words ")));
        assert_eq!(selection.text, "highlighted words");
        assert_eq!(selection.origin, UtteranceOrigin::Selection);

        assert!(session.on_utterance_finished(selection.id).is_empty());
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn blank_selection_falls_back_to_current_page() {
        let mut session = session_with_pages(3);
        session.go_to_page(2);

        let utterance = only_utterance(&session.read(Some("   ")));

        assert_eq!(utterance.origin, UtteranceOrigin::Page(2));
        assert!(session.read_selection("\n").is_empty());
    }

    #[test]
    fn rate_change_while_speaking_restarts_current_page() {
        let mut session = session_with_pages(3);
        session.go_to_page(1);
        let first = only_utterance(&session.read_page(1));

        let effects = session.set_rate(2.0);

        assert!(matches!(effects[0], PlaybackEffect::CancelSpeech));
        let restarted = only_utterance(&effects);
        assert_eq!(restarted.origin, UtteranceOrigin::Page(1));
        assert!((restarted.rate - 2.0).abs() < f32::EPSILON);
        assert!(first.cancel.is_cancelled());
    }

    #[test]
    fn parameter_changes_while_idle_or_paused_only_update_state() {
        let mut session = session_with_pages(2);
        assert!(session.set_rate(0.75).is_empty());
        assert!(session.set_voice(Some(VoiceRef::new("ryan"))).is_empty());

        session.read_page(0);
        session.pause();
        assert!(session.set_rate(1.25).is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Paused);

        assert!((session.state().rate - 1.25).abs() < f32::EPSILON);
        assert_eq!(session.state().voice, Some(VoiceRef::new("ryan")));
    }

    #[test]
    fn invalid_or_unchanged_rate_is_ignored() {
        let mut session = session_with_pages(2);
        session.read_page(0);
        assert!(session.set_rate(0.0).is_empty());
        assert!(session.set_rate(f32::NAN).is_empty());
        assert!(session.set_rate(1.0).is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
    }

    #[test]
    fn voice_change_while_speaking_restarts_with_new_voice() {
        let mut session = session_with_pages(2);
        session.read_page(0);

        let restarted = only_utterance(&session.set_voice(Some(VoiceRef::new("lessac"))));

        assert_eq!(restarted.voice, Some(VoiceRef::new("lessac")));
        assert!(session.set_voice(Some(VoiceRef::new("lessac"))).is_empty());
    }

    #[test]
    fn failure_returns_to_idle_only_for_active_utterance() {
        let mut session = session_with_pages(2);
        let first = only_utterance(&session.read_page(0));
        let second = only_utterance(&session.read_page(1));

        assert!(!session.on_utterance_failed(first.id));
        assert_eq!(session.phase(), PlaybackPhase::Speaking);

        assert!(session.on_utterance_failed(second.id));
        assert_eq!(session.phase(), PlaybackPhase::Idle);
        assert_eq!(session.active_utterance(), None);
    }

    #[test]
    fn previous_and_next_stay_in_bounds() {
        let mut session = session_with_pages(2);
        assert!(session.previous_page().is_empty());
        assert!(matches!(
            session.next_page().as_slice(),
            [PlaybackEffect::ShowPage(1)]
        ));
        assert!(session.next_page().is_empty());
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn opening_a_new_document_keeps_ids_unique() {
        let mut session = session_with_pages(3);
        session.set_rate(2.0);
        session.next_page();
        let old = only_utterance(&session.read(None));

        let effects = session.open_document(Document::new("next.txt", "a b c d"), 2);
        assert!(matches!(effects.as_slice(), [PlaybackEffect::CancelSpeech]));
        assert!(old.cancel.is_cancelled());
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.last_page(), 1);
        assert_eq!(session.phase(), PlaybackPhase::Idle);
        assert_eq!(session.state().rate, 2.0);

        let fresh = only_utterance(&session.read(None));
        assert_ne!(fresh.id, old.id);
        assert!(!session.on_utterance_failed(old.id));
        assert!(session.on_utterance_finished(old.id).is_empty());
        assert_eq!(session.phase(), PlaybackPhase::Speaking);
    }
}
