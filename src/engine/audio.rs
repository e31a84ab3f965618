//! Audio backend used when there is no sound output.

use log::debug;

use crate::engine::playback::{AudioBackend, AudioError, AudioEvent, AudioResource};

/// Backend that produces no sound and only logs what it is asked to do.
pub struct SilentBackend;

struct SilentResource {
    url: String,
}

impl AudioBackend for SilentBackend {
    fn open(&mut self, url: &str) -> Result<Box<dyn AudioResource>, AudioError> {
        debug!("silent: open {url}");
        Ok(Box::new(SilentResource {
            url: url.to_string(),
        }))
    }
}

impl AudioResource for SilentResource {
    fn play(&mut self) -> Result<(), AudioError> {
        debug!("silent: play {}", self.url);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        debug!("silent: pause {}", self.url);
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        debug!("silent: volume {volume}");
        Ok(())
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        None
    }

    fn release(&mut self) {
        debug!("silent: release {}", self.url);
    }
}
