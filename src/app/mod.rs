mod messages;
mod state;
mod update;
mod view;

pub use state::App;

use crate::config::{AppConfig, ThemeMode};
use crate::speech::{AudioPlayer, SpeechBackend};
use iced::{Size, Task, Theme, window};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use update::Effect;

/// Launch the reader window, optionally opening `initial` right away.
pub fn run_app(
    config: AppConfig,
    backend: Arc<dyn SpeechBackend>,
    initial: Option<PathBuf>,
) -> iced::Result {
    let window_settings = window::Settings {
        size: Size::new(config.window_width, config.window_height),
        ..window::Settings::default()
    };

    iced::application(App::title, App::update, App::view)
        .window(window_settings)
        .subscription(App::subscription)
        .theme(|app: &App| {
            if matches!(app.config.theme, ThemeMode::Night) {
                Theme::Dark
            } else {
                Theme::Light
            }
        })
        .run_with(move || App::bootstrap(config, backend, initial))
}

impl App {
    fn bootstrap(
        config: AppConfig,
        backend: Arc<dyn SpeechBackend>,
        initial: Option<PathBuf>,
    ) -> (Self, Task<messages::Message>) {
        let player = match AudioPlayer::new() {
            Ok(player) => Some(player),
            Err(err) => {
                warn!("Audio output unavailable; speech will not play: {err:#}");
                None
            }
        };
        let mut app = App::new(config, backend, player);

        let mut effects = vec![Effect::LoadVoices];
        if let Some(path) = initial {
            app.open_path_input = path.display().to_string();
            effects.push(Effect::LoadDocument(path));
        }
        let tasks: Vec<_> = effects
            .into_iter()
            .map(|effect| app.run_effect(effect))
            .collect();
        (app, Task::batch(tasks))
    }
}
