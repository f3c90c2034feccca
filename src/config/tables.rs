use super::defaults;
use super::models::{AppConfig, LogLevel, RemoteTtsConfig, ThemeMode, TtsBackendKind};
use crate::pagination::clamp_page_size;
use crate::playback::{DEFAULT_RATE, sanitize_rate};
use serde::{Deserialize, Serialize};

/// On-disk layout of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    appearance: AppearanceConfig,
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    tts: TtsConfig,
    #[serde(default)]
    remote_tts: RemoteTtsConfig,
    #[serde(default)]
    features: FeaturesConfig,
    #[serde(default)]
    keys: KeysConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            theme: tables.appearance.theme,
            font_size: tables.appearance.font_size,
            line_spacing: tables.appearance.line_spacing,
            margin_horizontal: tables.appearance.margin_horizontal,
            margin_vertical: tables.appearance.margin_vertical,
            window_width: tables.appearance.window_width,
            window_height: tables.appearance.window_height,
            words_per_page: clamp_page_size(tables.reading.words_per_page),
            tts_backend: tables.tts.backend,
            tts_model_path: tables.tts.model_path,
            tts_voices_dir: tables.tts.voices_dir,
            tts_espeak_path: tables.tts.espeak_path,
            tts_voice: tables.tts.voice.filter(|voice| !voice.trim().is_empty()),
            tts_rate: sanitize_rate(tables.tts.rate).unwrap_or(DEFAULT_RATE),
            tts_volume: tables.tts.volume.clamp(0.0, 1.0),
            remote: tables.remote_tts,
            voice_selection: tables.features.voice_selection,
            bookmarks: tables.features.bookmarks,
            key_toggle_pause: tables.keys.toggle_pause,
            key_read: tables.keys.read,
            key_next_page: tables.keys.next_page,
            key_prev_page: tables.keys.prev_page,
            key_save_bookmark: tables.keys.save_bookmark,
            key_safe_quit: tables.keys.safe_quit,
            cache_dir: tables.storage.cache_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            appearance: AppearanceConfig {
                theme: config.theme,
                font_size: config.font_size,
                line_spacing: config.line_spacing,
                margin_horizontal: config.margin_horizontal,
                margin_vertical: config.margin_vertical,
                window_width: config.window_width,
                window_height: config.window_height,
            },
            reading: ReadingConfig {
                words_per_page: config.words_per_page,
            },
            tts: TtsConfig {
                backend: config.tts_backend,
                model_path: config.tts_model_path.clone(),
                voices_dir: config.tts_voices_dir.clone(),
                espeak_path: config.tts_espeak_path.clone(),
                voice: config.tts_voice.clone(),
                rate: config.tts_rate,
                volume: config.tts_volume,
            },
            remote_tts: config.remote.clone(),
            features: FeaturesConfig {
                voice_selection: config.voice_selection,
                bookmarks: config.bookmarks,
            },
            keys: KeysConfig {
                toggle_pause: config.key_toggle_pause.clone(),
                read: config.key_read.clone(),
                next_page: config.key_next_page.clone(),
                prev_page: config.key_prev_page.clone(),
                save_bookmark: config.key_save_bookmark.clone(),
                safe_quit: config.key_safe_quit.clone(),
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct AppearanceConfig {
    #[serde(default = "defaults::default_theme")]
    theme: ThemeMode,
    #[serde(default = "defaults::default_font_size")]
    font_size: u32,
    #[serde(default = "defaults::default_line_spacing")]
    line_spacing: f32,
    #[serde(default = "defaults::default_margin_horizontal")]
    margin_horizontal: u16,
    #[serde(default = "defaults::default_margin_vertical")]
    margin_vertical: u16,
    #[serde(default = "defaults::default_window_width")]
    window_width: f32,
    #[serde(default = "defaults::default_window_height")]
    window_height: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            theme: defaults::default_theme(),
            font_size: defaults::default_font_size(),
            line_spacing: defaults::default_line_spacing(),
            margin_horizontal: defaults::default_margin_horizontal(),
            margin_vertical: defaults::default_margin_vertical(),
            window_width: defaults::default_window_width(),
            window_height: defaults::default_window_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_words_per_page")]
    words_per_page: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            words_per_page: defaults::default_words_per_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TtsConfig {
    #[serde(default = "defaults::default_tts_backend")]
    backend: TtsBackendKind,
    #[serde(default = "defaults::default_tts_model")]
    model_path: String,
    #[serde(default = "defaults::default_tts_voices_dir")]
    voices_dir: String,
    #[serde(default = "defaults::default_tts_espeak_path")]
    espeak_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
    #[serde(default = "defaults::default_tts_rate")]
    rate: f32,
    #[serde(default = "defaults::default_tts_volume")]
    volume: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            backend: defaults::default_tts_backend(),
            model_path: defaults::default_tts_model(),
            voices_dir: defaults::default_tts_voices_dir(),
            espeak_path: defaults::default_tts_espeak_path(),
            voice: None,
            rate: defaults::default_tts_rate(),
            volume: defaults::default_tts_volume(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct FeaturesConfig {
    #[serde(default = "defaults::default_voice_selection")]
    voice_selection: bool,
    #[serde(default = "defaults::default_bookmarks")]
    bookmarks: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        FeaturesConfig {
            voice_selection: defaults::default_voice_selection(),
            bookmarks: defaults::default_bookmarks(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_pause")]
    toggle_pause: String,
    #[serde(default = "defaults::default_key_read")]
    read: String,
    #[serde(default = "defaults::default_key_next_page")]
    next_page: String,
    #[serde(default = "defaults::default_key_prev_page")]
    prev_page: String,
    #[serde(default = "defaults::default_key_save_bookmark")]
    save_bookmark: String,
    #[serde(default = "defaults::default_key_safe_quit")]
    safe_quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            toggle_pause: defaults::default_key_toggle_pause(),
            read: defaults::default_key_read(),
            next_page: defaults::default_key_next_page(),
            prev_page: defaults::default_key_prev_page(),
            save_bookmark: defaults::default_key_save_bookmark(),
            safe_quit: defaults::default_key_safe_quit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
