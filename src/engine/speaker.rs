//! Speaker output through rodio.
//!
//! Previews are short, so each one is downloaded whole and decoded from
//! memory. The bytes are kept for the lifetime of the resource so a preview
//! that played to the end can be queued again for replay.

use std::{io::Cursor, sync::Arc, time::Duration};

use log::{debug, info};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use crate::engine::playback::{AudioBackend, AudioError, AudioEvent, AudioResource};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RodioBackend {
    stream: OutputStream,
    http: reqwest::blocking::Client,
}

impl RodioBackend {
    /// Opens the default output device.
    pub fn open_default() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Control(format!("no audio output device: {e}")))?;
        stream.log_on_drop(false);

        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("tunequiz/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| AudioError::Control(format!("failed to build http client: {e}")))?;

        info!("opened default audio output");
        Ok(Self { stream, http })
    }

    fn download(&self, url: &str) -> Result<Arc<[u8]>, AudioError> {
        let open_error = |reason: String| AudioError::Open {
            url: url.to_string(),
            reason,
        };
        let bytes = self
            .http
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|e| open_error(e.to_string()))?;

        debug!("downloaded {} bytes from {url}", bytes.len());
        Ok(Arc::from(bytes.as_ref()))
    }
}

fn decode(url: &str, audio: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, AudioError> {
    Decoder::new(Cursor::new(Arc::clone(audio))).map_err(|e| AudioError::Open {
        url: url.to_string(),
        reason: format!("undecodable audio: {e}"),
    })
}

impl AudioBackend for RodioBackend {
    fn open(&mut self, url: &str) -> Result<Box<dyn AudioResource>, AudioError> {
        let audio = self.download(url)?;
        let source = decode(url, &audio)?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(source);

        Ok(Box::new(RodioResource {
            url: url.to_string(),
            audio,
            sink,
            ended: false,
        }))
    }
}

struct RodioResource {
    url: String,
    audio: Arc<[u8]>,
    sink: Sink,
    /// `Ended` was reported for the current queue
    ended: bool,
}

impl RodioResource {
    fn requeue(&mut self) -> Result<(), AudioError> {
        let source = decode(&self.url, &self.audio)?;
        self.sink.append(source);
        self.ended = false;
        Ok(())
    }
}

impl AudioResource for RodioResource {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.sink.empty() {
            self.requeue()?;
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.sink.pause();
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        if self.sink.empty() {
            return self.requeue();
        }
        self.sink
            .try_seek(Duration::ZERO)
            .map_err(|e| AudioError::Control(format!("could not rewind {}: {e}", self.url)))?;
        self.ended = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.sink.set_volume(volume);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        if self.ended || self.sink.is_paused() || !self.sink.empty() {
            return None;
        }
        debug!("finished {}", self.url);
        self.ended = true;
        Some(AudioEvent::Ended)
    }

    fn release(&mut self) {
        self.sink.stop();
        debug!("stopped {}", self.url);
    }
}
