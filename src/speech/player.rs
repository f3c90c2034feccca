use super::AudioClip;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the output device. Each clip gets its own `Sink` so stopping one
/// utterance never touches the next.
pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        info!("Opened audio output");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Queue `clip` on a fresh sink. The sink starts paused when the session
    /// was paused while the clip was being synthesized.
    pub fn start(&self, clip: &AudioClip, paused: bool, volume: f32) -> Result<Arc<Sink>> {
        let sink = Sink::try_new(&self.handle).context("Creating sink")?;
        sink.set_volume(volume);
        if paused {
            sink.pause();
        }
        match clip {
            AudioClip::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Opening audio clip {}", path.display()))?;
                let source = Decoder::new(BufReader::new(file)).context("Decoding audio clip")?;
                sink.append(source);
            }
            AudioClip::Encoded(bytes) => {
                let source =
                    Decoder::new(Cursor::new(bytes.clone())).context("Decoding audio stream")?;
                sink.append(source);
            }
        }
        debug!(paused, volume, "Started playback");
        Ok(Arc::new(sink))
    }
}
