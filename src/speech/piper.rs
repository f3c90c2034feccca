//! Local synthesis with `piper-rs`, cached as WAV files under the cache dir.

use super::{AudioClip, SpeechBackend, Voice};
use crate::playback::{Utterance, VoiceRef};
use anyhow::{Context, Result, anyhow, bail};
use hound::WavSpec;
use piper_rs::from_config_path;
use piper_rs::synth::{AudioOutputConfig, PiperSpeechSynthesizer};
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const ESPEAK_DATA_ENV: &str = "PIPER_ESPEAKNG_DATA_DIRECTORY";

#[derive(Debug, Clone)]
pub struct PiperBackend {
    default_model: PathBuf,
    voices_dir: PathBuf,
    cache_root: PathBuf,
}

impl PiperBackend {
    pub fn new(
        default_model: PathBuf,
        voices_dir: PathBuf,
        espeak_path: PathBuf,
        cache_root: PathBuf,
    ) -> Self {
        let espeak_path = sanitize_espeak_root(espeak_path);
        if env::var_os(ESPEAK_DATA_ENV).is_none() {
            // Safe because the backend is built in main before any worker thread exists.
            unsafe {
                env::set_var(ESPEAK_DATA_ENV, &espeak_path);
            }
        }
        info!(
            model = %default_model.display(),
            voices_dir = %voices_dir.display(),
            espeak_root = %espeak_path.display(),
            "Initializing Piper backend"
        );
        Self {
            default_model,
            voices_dir,
            cache_root,
        }
    }

    /// Model file for `voice`; `None` means the configured default.
    fn resolve_model(&self, voice: Option<&VoiceRef>) -> Result<PathBuf> {
        let Some(voice) = voice else {
            return Ok(self.default_model.clone());
        };
        if voice_name(&self.default_model).as_deref() == Some(voice.name()) {
            return Ok(self.default_model.clone());
        }
        discover_piper_voices(&self.default_model, &self.voices_dir)
            .into_iter()
            .find(|candidate| candidate.name == voice.name())
            .map(|candidate| PathBuf::from(candidate.origin))
            .ok_or_else(|| anyhow!("Unknown Piper voice '{}'", voice.name()))
    }
}

impl SpeechBackend for PiperBackend {
    fn name(&self) -> &'static str {
        "piper"
    }

    fn voices(&self) -> Result<Vec<Voice>> {
        Ok(discover_piper_voices(&self.default_model, &self.voices_dir))
    }

    fn synthesize(&self, utterance: &Utterance) -> Result<AudioClip> {
        utterance.cancel.check_cancelled("piper-start")?;
        let model_path = self.resolve_model(utterance.voice.as_ref())?;
        let path = cache_path(&self.cache_root, &model_path, &utterance.text, utterance.rate);
        if path.exists() {
            debug!(id = %utterance.id, path = %path.display(), "Reusing cached utterance audio");
            return Ok(AudioClip::File(path));
        }

        let config_path = resolve_piper_config(&model_path);
        if !config_path.exists() {
            bail!(
                "Piper config not found at {} (expected from {})",
                config_path.display(),
                model_path.display()
            );
        }
        let model = from_config_path(&config_path).context("Loading Piper model")?;
        let piper = PiperSpeechSynthesizer::new(model).context("Preparing Piper synthesizer")?;
        utterance.cancel.check_cancelled("piper-model")?;

        synth_with_piper(&piper, &path, utterance)?;
        Ok(AudioClip::File(path))
    }
}

/// Default model first, then every `*.onnx` in `voices_dir` (recursively)
/// that has its `.onnx.json` config next to it, sorted by name.
pub fn discover_piper_voices(default_model: &Path, voices_dir: &Path) -> Vec<Voice> {
    let mut found = Vec::new();
    collect_models(voices_dir, &mut found);
    found.sort();

    let mut voices = Vec::with_capacity(found.len() + 1);
    if let Some(name) = voice_name(default_model) {
        voices.push(Voice::new(name, default_model.display().to_string()));
    }
    for model in found {
        let Some(name) = voice_name(&model) else {
            continue;
        };
        if voices.iter().any(|voice| voice.name == name) {
            continue;
        }
        voices.push(Voice::new(name, model.display().to_string()));
    }
    debug!(count = voices.len(), dir = %voices_dir.display(), "Discovered Piper voices");
    voices
}

fn collect_models(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), "Skipping voice directory: {err}");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_models(&path, found);
        } else if is_onnx(&path) && resolve_piper_config(&path).exists() {
            found.push(path);
        }
    }
}

fn is_onnx(path: &Path) -> bool {
    path.extension().map(|ext| ext == "onnx").unwrap_or(false)
}

fn voice_name(model_path: &Path) -> Option<String> {
    model_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn cache_path(base: &Path, model_path: &Path, text: &str, rate: f32) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(model_path.as_os_str().to_string_lossy().as_bytes());
    hasher.update(text.as_bytes());
    hasher.update(rate.to_le_bytes());
    let hash = format!("{:x}", hasher.finalize());
    base.join(format!("tts-{hash}.wav"))
}

/// Piper expects the parent directory that contains `espeak-ng-data/phonindex`.
/// Users often point directly at `.../espeak-ng-data`; trim that to avoid
/// duplicated segments like `/espeak-ng-data/espeak-ng-data/phonindex`.
fn sanitize_espeak_root(path: PathBuf) -> PathBuf {
    if path
        .file_name()
        .map(|n| n == "espeak-ng-data")
        .unwrap_or(false)
    {
        if let Some(parent) = path.parent() {
            debug!(
                original = %path.display(),
                sanitized = %parent.display(),
                "Trimming espeak-ng-data suffix"
            );
            return parent.to_path_buf();
        }
    }
    path
}

fn resolve_piper_config(model_path: &Path) -> PathBuf {
    if is_onnx(model_path) {
        return model_path.with_extension("onnx.json");
    }
    model_path.to_path_buf()
}

fn synth_with_piper(
    piper: &PiperSpeechSynthesizer,
    path: &Path,
    utterance: &Utterance,
) -> Result<()> {
    debug!(
        id = %utterance.id,
        path = %path.display(),
        rate = utterance.rate,
        chars = utterance.text.len(),
        "Synthesizing utterance with Piper"
    );
    let output_config = if (utterance.rate - 1.0).abs() <= f32::EPSILON {
        None
    } else {
        Some(AudioOutputConfig {
            rate: Some(rate_to_percent(utterance.rate)),
            volume: None,
            pitch: None,
            appended_silence_ms: None,
        })
    };

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate: Option<u32> = None;
    let mut channels: Option<u16> = None;
    for chunk in piper.synthesize_lazy(utterance.text.clone(), output_config)? {
        utterance.cancel.check_cancelled("piper-chunk")?;
        let chunk = chunk?;
        if sample_rate.is_none() {
            sample_rate = Some(chunk.info.sample_rate as u32);
            channels = Some(chunk.info.num_channels as u16);
        }
        samples.extend_from_slice(chunk.samples.as_slice());
    }

    if samples.is_empty() {
        bail!("No speech data to write");
    }

    write_wav(
        path,
        sample_rate.unwrap_or(22050),
        channels.unwrap_or(1),
        &samples,
    )
}

/// Written through a temp file so an interrupted write never leaves a
/// truncated clip where the cache lookup would find it.
fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[f32]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Creating TTS cache directory")?;
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let temp_path = unique_temp_wav_path(path);
    let mut writer = hound::WavWriter::create(&temp_path, spec).context("Creating WAV file")?;
    for &s in samples {
        let clamped = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(clamped)?;
    }
    writer.finalize().context("Finalizing WAV file")?;
    if fs::rename(&temp_path, path).is_err() {
        fs::copy(&temp_path, path).context("Moving WAV into cache")?;
        if let Err(err) = fs::remove_file(&temp_path) {
            warn!(path = %temp_path.display(), "Failed to remove temp WAV: {err}");
        }
    }
    Ok(())
}

fn unique_temp_wav_path(path: &Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nonce = SEQ.fetch_add(1, Ordering::Relaxed);
    let ts_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut temp_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("tts.wav")
        .to_string();
    temp_name.push_str(&format!(".tmp-{ts_nanos}-{nonce}"));
    path.with_file_name(temp_name)
}

/// Piper's rate knob is a 0-100 percentage; spread the useful part of the
/// session's rate range across it.
fn rate_to_percent(rate: f32) -> u8 {
    let clamped = rate.clamp(0.5, 5.5);
    let percent = ((clamped - 0.5) / 5.0) * 100.0;
    percent.round().clamp(0.0, 100.0) as u8
}
