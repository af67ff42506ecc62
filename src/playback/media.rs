//! Media handle seam and a clock-driven stand-in player.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

use crate::feed::MediaItem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaInitError {
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),
    #[error("Media backend failed: {0}")]
    Backend(String),
}

/// A player bound to one item's media.
///
/// Calls are synchronous and must not block; a real backend queues them.
pub trait MediaHandle {
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn set_looping(&mut self, looping: bool);
    /// Start playback. On most backends this restarts a finished or paused
    /// item, so callers check [`MediaHandle::is_playing`] first.
    fn play(&mut self);
    fn is_playing(&self) -> bool;
    /// Free decoder resources. The handle is dropped right after.
    fn release(&mut self);
    /// Current playback position, if the backend reports one.
    fn position(&self) -> Option<Duration> {
        None
    }
}

/// Creates handles for items entering the rendered window.
pub trait MediaFactory {
    fn create(&self, item: &MediaItem) -> Result<Box<dyn MediaHandle>, MediaInitError>;
}

/// Player that only keeps time. Used by the terminal front-end, which has
/// no decoder.
pub struct SimulatedPlayer {
    duration: Duration,
    volume: f32,
    looping: bool,
    started_at: Option<Instant>,
    released: bool,
}

impl SimulatedPlayer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: duration.max(Duration::from_millis(1)),
            volume: 0.0,
            looping: false,
            started_at: None,
            released: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }
}

impl MediaHandle for SimulatedPlayer {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn play(&mut self) {
        if self.released {
            return;
        }
        self.started_at = Some(Instant::now());
    }

    fn is_playing(&self) -> bool {
        match self.elapsed() {
            Some(elapsed) => self.looping || elapsed < self.duration,
            None => false,
        }
    }

    fn release(&mut self) {
        self.released = true;
        self.started_at = None;
    }

    fn position(&self) -> Option<Duration> {
        let elapsed = self.elapsed()?;
        if self.looping {
            let nanos = elapsed.as_nanos() % self.duration.as_nanos();
            Some(Duration::from_nanos(nanos as u64))
        } else {
            Some(elapsed.min(self.duration))
        }
    }
}

/// Factory for [`SimulatedPlayer`]s. Rejects media URLs that are not
/// http(s), which surfaces as an inert item.
pub struct SimulatedFactory {
    pub clip_length: Duration,
}

impl Default for SimulatedFactory {
    fn default() -> Self {
        Self {
            clip_length: Duration::from_secs(15),
        }
    }
}

impl MediaFactory for SimulatedFactory {
    fn create(&self, item: &MediaItem) -> Result<Box<dyn MediaHandle>, MediaInitError> {
        let url = Url::parse(&item.media_url)
            .map_err(|e| MediaInitError::InvalidUrl(format!("{}: {e}", item.media_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MediaInitError::InvalidUrl(format!(
                "{}: unsupported scheme",
                item.media_url
            )));
        }
        Ok(Box::new(SimulatedPlayer::new(self.clip_length)))
    }
}
