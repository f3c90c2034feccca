use super::super::super::messages::Message;
use super::super::super::state::App;
use iced::keyboard::{Key, Modifiers, key};

impl App {
    pub(super) fn shortcut_message_for_key(
        &self,
        key: Key,
        modifiers: Modifiers,
    ) -> Option<Message> {
        let pressed = match key.as_ref() {
            Key::Named(key::Named::Space) => "space".to_string(),
            Key::Character(ch) => ch.to_ascii_lowercase(),
            _ => return None,
        };

        let bindings: [(&str, &str, Message); 6] = [
            (self.config.key_toggle_pause.as_str(), "space", Message::TogglePause),
            (self.config.key_read.as_str(), "r", Message::Read),
            (self.config.key_next_page.as_str(), "n", Message::NextPage),
            (self.config.key_prev_page.as_str(), "p", Message::PreviousPage),
            (self.config.key_save_bookmark.as_str(), "b", Message::SaveBookmark),
            (self.config.key_safe_quit.as_str(), "q", Message::SafeQuit),
        ];
        bindings
            .into_iter()
            .find(|(raw, fallback, _)| Self::shortcut_matches(raw, fallback, &pressed, modifiers))
            .map(|(_, _, message)| message)
    }

    pub(super) fn shortcut_matches(
        raw: &str,
        fallback: &str,
        pressed: &str,
        modifiers: Modifiers,
    ) -> bool {
        let normalized = Self::normalize_shortcut_token(raw, fallback);

        let mut required_ctrl = false;
        let mut required_alt = false;
        let mut required_logo = false;
        let mut required_shift = false;
        let mut required_key: Option<&str> = None;

        for token in normalized
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match token {
                "ctrl" | "control" => required_ctrl = true,
                "alt" => required_alt = true,
                "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
                "shift" => required_shift = true,
                key => required_key = Some(key),
            }
        }

        let required_key = required_key.unwrap_or(fallback);
        if pressed != required_key {
            return false;
        }

        modifiers.control() == required_ctrl
            && modifiers.alt() == required_alt
            && modifiers.logo() == required_logo
            && modifiers.shift() == required_shift
    }

    pub(super) fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            fallback.to_string()
        } else {
            normalized.replace("spacebar", "space")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::playback::Utterance;
    use crate::speech::{AudioClip, SpeechBackend, Voice};
    use anyhow::{Result, bail};
    use std::sync::Arc;

    struct NoBackend;

    impl SpeechBackend for NoBackend {
        fn name(&self) -> &'static str {
            "none"
        }

        fn voices(&self) -> Result<Vec<Voice>> {
            Ok(Vec::new())
        }

        fn synthesize(&self, _utterance: &Utterance) -> Result<AudioClip> {
            bail!("no speech")
        }
    }

    fn app_with(config: AppConfig) -> App {
        App::new(config, Arc::new(NoBackend), None)
    }

    fn char_key(ch: &str) -> Key {
        Key::Character(ch.into())
    }

    #[test]
    fn normalizes_spacebar_alias() {
        assert_eq!(App::normalize_shortcut_token(" SpaceBar ", "x"), "space");
    }

    #[test]
    fn matches_ctrl_shortcut() {
        assert!(App::shortcut_matches("ctrl+r", "x", "r", Modifiers::CTRL));
    }

    #[test]
    fn rejects_unexpected_extra_modifier() {
        assert!(!App::shortcut_matches(
            "ctrl+r",
            "x",
            "r",
            Modifiers::CTRL | Modifiers::SHIFT,
        ));
    }

    #[test]
    fn default_bindings_map_to_playback_messages() {
        let app = app_with(AppConfig::default());
        let none = Modifiers::empty();

        assert!(matches!(
            app.shortcut_message_for_key(Key::Named(key::Named::Space), none),
            Some(Message::TogglePause)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(char_key("R"), none),
            Some(Message::Read)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(char_key("n"), none),
            Some(Message::NextPage)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(char_key("p"), none),
            Some(Message::PreviousPage)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(char_key("b"), none),
            Some(Message::SaveBookmark)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(char_key("q"), none),
            Some(Message::SafeQuit)
        ));
        assert!(app.shortcut_message_for_key(char_key("z"), none).is_none());
    }

    #[test]
    fn rebinding_replaces_the_default_key() {
        let mut config = AppConfig::default();
        config.key_read = "ctrl+enter".to_string();
        config.key_next_page = "l".to_string();
        let app = app_with(config);

        assert!(app
            .shortcut_message_for_key(char_key("r"), Modifiers::empty())
            .is_none());
        assert!(matches!(
            app.shortcut_message_for_key(char_key("l"), Modifiers::empty()),
            Some(Message::NextPage)
        ));
    }
}
