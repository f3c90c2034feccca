//! HTTP speech backend speaking the common `/v1/audio/speech` request shape.

use super::{AudioClip, SpeechBackend, Voice};
use crate::config::RemoteTtsConfig;
use crate::playback::Utterance;
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RemoteSpeechRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub voice: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    pub response_format: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteBackend {
    config: RemoteTtsConfig,
}

impl RemoteBackend {
    pub fn new(config: RemoteTtsConfig) -> Self {
        info!(
            endpoint = %config.endpoint,
            model = %config.model,
            voices = config.voices.len(),
            "Initializing remote speech backend"
        );
        Self { config }
    }

    fn default_voice(&self) -> &str {
        self.config
            .voices
            .first()
            .map(String::as_str)
            .unwrap_or("alloy")
    }

    pub fn request_for<'a>(&'a self, utterance: &'a Utterance) -> RemoteSpeechRequest<'a> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|voice| voice.name())
            .unwrap_or_else(|| self.default_voice());
        RemoteSpeechRequest {
            model: &self.config.model,
            input: &utterance.text,
            voice,
            speed: ((utterance.rate - 1.0).abs() > f32::EPSILON).then_some(utterance.rate),
            response_format: &self.config.response_format,
        }
    }

    fn api_key(&self) -> Result<String> {
        let key = env::var(&self.config.api_key_env).with_context(|| {
            format!(
                "Remote speech API key missing; set {}",
                self.config.api_key_env
            )
        })?;
        if key.trim().is_empty() {
            bail!(
                "Remote speech API key in {} is empty",
                self.config.api_key_env
            );
        }
        Ok(key)
    }
}

impl SpeechBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn voices(&self) -> Result<Vec<Voice>> {
        Ok(self
            .config
            .voices
            .iter()
            .map(|name| Voice::new(name.clone(), self.config.endpoint.clone()))
            .collect())
    }

    fn synthesize(&self, utterance: &Utterance) -> Result<AudioClip> {
        utterance.cancel.check_cancelled("remote-start")?;
        let api_key = self.api_key()?;
        let request = self.request_for(utterance);
        let body = serde_json::to_vec(&request).context("Encoding speech request")?;

        // Blocking clients own a runtime; build it on the worker thread.
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs.max(1)))
            .build()
            .context("Building HTTP client")?;

        debug!(
            id = %utterance.id,
            voice = request.voice,
            chars = utterance.text.len(),
            "Requesting remote speech"
        );
        let response = client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .with_context(|| format!("Remote speech request to {} failed", self.config.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            warn!(%status, "Remote speech request rejected");
            bail!(
                "Remote speech service returned {status}: {}",
                truncate(detail.trim(), ERROR_BODY_LIMIT)
            );
        }

        let audio = response.bytes().context("Reading remote speech audio")?;
        utterance.cancel.check_cancelled("remote-done")?;
        if audio.is_empty() {
            bail!("Remote speech service returned no audio");
        }
        debug!(id = %utterance.id, bytes = audio.len(), "Received remote speech audio");
        Ok(AudioClip::Encoded(audio.to_vec()))
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
