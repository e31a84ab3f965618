use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("could not open {url}: {reason}")]
    Open { url: String, reason: String },

    #[error("audio control failed: {0}")]
    Control(String),
}

/// Notification raised by a loaded audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Play,
    Pause,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Ended,
}

/// Whether a freshly loaded resource starts playing on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    AutoPlay,
    Manual,
}

/// One playable media handle
pub trait AudioResource {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn seek_to_start(&mut self) -> Result<(), AudioError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
    /// next pending notification, if any
    fn poll_event(&mut self) -> Option<AudioEvent>;
    /// stops output and frees the handle; no other call follows
    fn release(&mut self);
}

pub trait AudioBackend {
    fn open(&mut self, url: &str) -> Result<Box<dyn AudioResource>, AudioError>;
}

type Listener = Box<dyn FnMut(PlaybackState)>;

/// NaN counts as silence
fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Owns at most one audio resource at a time.
///
/// Loading a new URL always tears down the previous resource first, and
/// dropping the controller releases whatever is still loaded, so two
/// previews never play over each other.
pub struct PlaybackController {
    backend: Box<dyn AudioBackend>,
    active: Option<Box<dyn AudioResource>>,
    url: Option<String>,
    state: PlaybackState,
    volume: f32,
    listeners: Vec<Listener>,
}

impl PlaybackController {
    pub fn new(backend: Box<dyn AudioBackend>, volume: f32) -> Self {
        Self {
            backend,
            active: None,
            url: None,
            state: PlaybackState::Idle,
            volume: clamp_volume(volume),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// registers a callback invoked on every state change
    pub fn subscribe(&mut self, listener: impl FnMut(PlaybackState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the loaded resource with `url`.
    ///
    /// A failed auto-play leaves the resource loaded but not playing.
    pub fn load(&mut self, url: &str, policy: LoadPolicy) -> Result<(), AudioError> {
        self.teardown();

        let mut resource = self.backend.open(url)?;
        if let Err(e) = resource.set_volume(self.volume) {
            warn!("could not set volume on {url}: {e}");
        }
        debug!("loaded {url}");

        self.active = Some(resource);
        self.url = Some(url.to_string());
        self.set_state(PlaybackState::Paused);

        if policy == LoadPolicy::AutoPlay {
            self.play();
        }
        Ok(())
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Playing {
            return;
        }
        let Some(resource) = self.active.as_mut() else {
            return;
        };

        match resource.play() {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(e) => warn!("playback did not start: {e}"),
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(resource) = self.active.as_mut() else {
            return;
        };

        match resource.pause() {
            Ok(()) => self.set_state(PlaybackState::Paused),
            Err(e) => warn!("could not pause playback: {e}"),
        }
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// seek to start, then play
    pub fn replay(&mut self) {
        let Some(resource) = self.active.as_mut() else {
            return;
        };

        if let Err(e) = resource.seek_to_start() {
            warn!("could not rewind playback: {e}");
            return;
        }
        // a rewound resource is not playing until told to
        if self.state == PlaybackState::Playing || self.state == PlaybackState::Ended {
            self.set_state(PlaybackState::Paused);
        }
        self.play();
    }

    /// clamps to [0, 1] and applies to the loaded resource
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);

        if let Some(resource) = self.active.as_mut() {
            if let Err(e) = resource.set_volume(self.volume) {
                warn!("could not set volume: {e}");
            }
        }
    }

    /// Applies notifications raised by the resource since the last poll.
    pub fn poll(&mut self) -> PlaybackState {
        loop {
            let event = self.active.as_mut().and_then(|r| r.poll_event());
            let Some(event) = event else {
                break;
            };
            self.handle_event(event);
        }
        self.state
    }

    pub fn handle_event(&mut self, event: AudioEvent) {
        if self.active.is_none() {
            return;
        }
        let state = match event {
            AudioEvent::Play => PlaybackState::Playing,
            AudioEvent::Pause => PlaybackState::Paused,
            AudioEvent::Ended => PlaybackState::Ended,
        };
        self.set_state(state);
    }

    /// Stops and releases the loaded resource, if any.
    pub fn teardown(&mut self) {
        if let Some(mut resource) = self.active.take() {
            if self.state == PlaybackState::Playing {
                if let Err(e) = resource.pause() {
                    debug!("pause before release failed: {e}");
                }
            }
            resource.release();
            debug!("released {}", self.url.as_deref().unwrap_or("audio"));
        }
        self.url = None;
        self.set_state(PlaybackState::Idle);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        self.state = state;
        for listener in &mut self.listeners {
            listener(state);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}


#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::recording::RecordingBackend;
    use super::*;

    fn controller() -> (PlaybackController, Rc<RefCell<recording::Journal>>) {
        let (backend, journal) = RecordingBackend::new();
        (PlaybackController::new(Box::new(backend), 0.5), journal)
    }

    #[test]
    fn test_controls_without_resource_are_noops() {
        let (mut playback, journal) = controller();

        playback.play();
        playback.pause();
        playback.replay();
        playback.toggle();

        assert_eq!(playback.state(), PlaybackState::Idle);
        assert!(journal.borrow().calls.is_empty());
    }

    #[test]
    fn test_load_tears_down_previous_resource_first() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();

        playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay)?;
        playback.load("https://cdn/b.mp3", LoadPolicy::AutoPlay)?;

        let calls = journal.borrow().calls.clone();
        let release_a = calls
            .iter()
            .position(|c| c == "release https://cdn/a.mp3")
            .unwrap();
        let open_b = calls
            .iter()
            .position(|c| c == "open https://cdn/b.mp3")
            .unwrap();
        assert!(release_a < open_b);
        assert!(calls.contains(&"pause https://cdn/a.mp3".to_string()));
        assert_eq!(journal.borrow().open_resources(), 1);
        assert_eq!(playback.current_url(), Some("https://cdn/b.mp3"));

        Ok(())
    }

    #[test]
    fn test_manual_load_does_not_play() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();

        playback.load("https://cdn/a.mp3", LoadPolicy::Manual)?;

        assert_eq!(playback.state(), PlaybackState::Paused);
        assert!(!journal.borrow().calls.iter().any(|c| c.starts_with("play")));

        Ok(())
    }

    #[test]
    fn test_blocked_autoplay_is_swallowed() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();
        journal.borrow_mut().fail_play = true;

        playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay)?;

        assert!(playback.is_loaded());
        assert!(!playback.is_playing());

        Ok(())
    }

    #[test]
    fn test_play_pause_are_idempotent() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();
        playback.load("https://cdn/a.mp3", LoadPolicy::Manual)?;

        playback.play();
        playback.play();
        playback.pause();
        playback.pause();

        let calls = &journal.borrow().calls;
        assert_eq!(calls.iter().filter(|c| c.starts_with("play")).count(), 1);
        assert_eq!(calls.iter().filter(|c| c.starts_with("pause")).count(), 1);

        Ok(())
    }

    #[test]
    fn test_replay_after_end_restarts() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();
        playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay)?;
        journal.borrow_mut().events.push_back(AudioEvent::Ended);

        assert_eq!(playback.poll(), PlaybackState::Ended);

        playback.replay();

        assert_eq!(playback.state(), PlaybackState::Playing);
        let calls = &journal.borrow().calls;
        assert_eq!(calls[calls.len() - 2], "seek https://cdn/a.mp3");
        assert_eq!(calls[calls.len() - 1], "play https://cdn/a.mp3");

        Ok(())
    }

    #[test]
    fn test_volume_is_clamped() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();
        playback.load("https://cdn/a.mp3", LoadPolicy::Manual)?;

        playback.set_volume(3.0);
        assert_eq!(playback.volume(), 1.0);

        playback.set_volume(-1.0);
        assert_eq!(playback.volume(), 0.0);

        playback.set_volume(f32::NAN);
        assert_eq!(playback.volume(), 0.0);

        assert!(
            journal
                .borrow()
                .calls
                .contains(&"volume 1 https://cdn/a.mp3".to_string())
        );

        Ok(())
    }

    #[test]
    fn test_initial_volume_is_clamped_too() -> anyhow::Result<()> {
        let (backend, journal) = RecordingBackend::new();
        let mut playback = PlaybackController::new(Box::new(backend), f32::NAN);
        assert_eq!(playback.volume(), 0.0);

        playback.load("https://cdn/a.mp3", LoadPolicy::Manual)?;
        assert!(
            journal
                .borrow()
                .calls
                .contains(&"volume 0 https://cdn/a.mp3".to_string())
        );

        let (backend, _) = RecordingBackend::new();
        assert_eq!(PlaybackController::new(Box::new(backend), 7.5).volume(), 1.0);

        Ok(())
    }

    #[test]
    fn test_listeners_see_each_transition_once() -> anyhow::Result<()> {
        let (mut playback, _journal) = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        playback.subscribe(move |state| sink.borrow_mut().push(state));

        playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay)?;
        playback.pause();
        playback.teardown();
        playback.teardown();

        assert_eq!(
            *seen.borrow(),
            vec![
                PlaybackState::Paused,
                PlaybackState::Playing,
                PlaybackState::Paused,
                PlaybackState::Idle,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_drop_releases_resource() -> anyhow::Result<()> {
        let (mut playback, journal) = controller();
        playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay)?;

        drop(playback);

        assert_eq!(journal.borrow().open_resources(), 0);

        Ok(())
    }

    #[test]
    fn test_open_failure_leaves_controller_idle() {
        let (mut playback, journal) = controller();
        journal.borrow_mut().fail_open = true;

        assert!(playback.load("https://cdn/a.mp3", LoadPolicy::AutoPlay).is_err());
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert!(!playback.is_loaded());
    }
}
