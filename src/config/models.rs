use crate::config::defaults;
use serde::{Deserialize, Serialize};

/// Flat view of every user-tunable setting.
///
/// On disk the settings are grouped into tables (see `tables.rs`); the rest
/// of the app only ever sees this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub theme: ThemeMode,
    pub font_size: u32,
    pub line_spacing: f32,
    pub margin_horizontal: u16,
    pub margin_vertical: u16,
    pub window_width: f32,
    pub window_height: f32,
    pub words_per_page: usize,
    pub tts_backend: TtsBackendKind,
    pub tts_model_path: String,
    pub tts_voices_dir: String,
    pub tts_espeak_path: String,
    pub tts_voice: Option<String>,
    pub tts_rate: f32,
    pub tts_volume: f32,
    pub remote: RemoteTtsConfig,
    pub voice_selection: bool,
    pub bookmarks: bool,
    pub key_toggle_pause: String,
    pub key_read: String,
    pub key_next_page: String,
    pub key_prev_page: String,
    pub key_save_bookmark: String,
    pub key_safe_quit: String,
    pub cache_dir: String,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            theme: defaults::default_theme(),
            font_size: defaults::default_font_size(),
            line_spacing: defaults::default_line_spacing(),
            margin_horizontal: defaults::default_margin_horizontal(),
            margin_vertical: defaults::default_margin_vertical(),
            window_width: defaults::default_window_width(),
            window_height: defaults::default_window_height(),
            words_per_page: defaults::default_words_per_page(),
            tts_backend: defaults::default_tts_backend(),
            tts_model_path: defaults::default_tts_model(),
            tts_voices_dir: defaults::default_tts_voices_dir(),
            tts_espeak_path: defaults::default_tts_espeak_path(),
            tts_voice: None,
            tts_rate: defaults::default_tts_rate(),
            tts_volume: defaults::default_tts_volume(),
            remote: RemoteTtsConfig::default(),
            voice_selection: defaults::default_voice_selection(),
            bookmarks: defaults::default_bookmarks(),
            key_toggle_pause: defaults::default_key_toggle_pause(),
            key_read: defaults::default_key_read(),
            key_next_page: defaults::default_key_next_page(),
            key_prev_page: defaults::default_key_prev_page(),
            key_save_bookmark: defaults::default_key_save_bookmark(),
            key_safe_quit: defaults::default_key_safe_quit(),
            cache_dir: defaults::default_cache_dir(),
            log_level: defaults::default_log_level(),
        }
    }
}

/// Settings for the HTTP speech backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteTtsConfig {
    #[serde(default = "defaults::default_remote_endpoint")]
    pub endpoint: String,
    #[serde(default = "defaults::default_remote_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "defaults::default_remote_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "defaults::default_remote_voices")]
    pub voices: Vec<String>,
    #[serde(default = "defaults::default_remote_response_format")]
    pub response_format: String,
    #[serde(default = "defaults::default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteTtsConfig {
    fn default() -> Self {
        RemoteTtsConfig {
            endpoint: defaults::default_remote_endpoint(),
            model: defaults::default_remote_model(),
            api_key_env: defaults::default_remote_api_key_env(),
            voices: defaults::default_remote_voices(),
            response_format: defaults::default_remote_response_format(),
            timeout_secs: defaults::default_remote_timeout_secs(),
        }
    }
}

/// Theme mode.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    Day,
    #[default]
    Night,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Day => ThemeMode::Night,
            ThemeMode::Night => ThemeMode::Day,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Day => "Day",
            ThemeMode::Night => "Night",
        };
        write!(f, "{}", label)
    }
}

/// Which speech backend synthesizes utterances.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackendKind {
    #[default]
    Piper,
    Remote,
}

impl std::fmt::Display for TtsBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TtsBackendKind::Piper => "piper",
            TtsBackendKind::Remote => "remote",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
