use crate::config::{LogLevel, ThemeMode, TtsBackendKind};
use crate::pagination::DEFAULT_WORDS_PER_PAGE;
use crate::playback::DEFAULT_RATE;

pub(crate) fn default_theme() -> ThemeMode {
    ThemeMode::Night
}

pub(crate) fn default_font_size() -> u32 {
    20
}

pub(crate) fn default_line_spacing() -> f32 {
    1.3
}

pub(crate) fn default_margin_horizontal() -> u16 {
    64
}

pub(crate) fn default_margin_vertical() -> u16 {
    12
}

pub(crate) fn default_window_width() -> f32 {
    1024.0
}

pub(crate) fn default_window_height() -> f32 {
    768.0
}

pub(crate) fn default_words_per_page() -> usize {
    DEFAULT_WORDS_PER_PAGE
}

pub(crate) fn default_tts_backend() -> TtsBackendKind {
    TtsBackendKind::Piper
}

pub(crate) fn default_tts_model() -> String {
    "/usr/share/piper-voices/en/en_US/ryan/high/en_US-ryan-high.onnx".to_string()
}

pub(crate) fn default_tts_voices_dir() -> String {
    "/usr/share/piper-voices".to_string()
}

pub(crate) fn default_tts_espeak_path() -> String {
    "/usr/share".to_string()
}

pub(crate) fn default_tts_rate() -> f32 {
    DEFAULT_RATE
}

pub(crate) fn default_tts_volume() -> f32 {
    1.0
}

pub(crate) fn default_remote_endpoint() -> String {
    "https://api.openai.com/v1/audio/speech".to_string()
}

pub(crate) fn default_remote_model() -> String {
    "tts-1".to_string()
}

pub(crate) fn default_remote_api_key_env() -> String {
    "LECTERN_TTS_API_KEY".to_string()
}

pub(crate) fn default_remote_voices() -> Vec<String> {
    ["alloy", "echo", "fable", "onyx", "nova", "shimmer"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub(crate) fn default_remote_response_format() -> String {
    "mp3".to_string()
}

pub(crate) fn default_remote_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_voice_selection() -> bool {
    true
}

pub(crate) fn default_bookmarks() -> bool {
    true
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(crate) fn default_key_toggle_pause() -> String {
    "space".to_string()
}

pub(crate) fn default_key_read() -> String {
    "r".to_string()
}

pub(crate) fn default_key_next_page() -> String {
    "n".to_string()
}

pub(crate) fn default_key_prev_page() -> String {
    "p".to_string()
}

pub(crate) fn default_key_save_bookmark() -> String {
    "b".to_string()
}

pub(crate) fn default_key_safe_quit() -> String {
    "q".to_string()
}
