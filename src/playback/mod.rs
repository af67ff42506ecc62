//! Playback arbitration for rendered feed items.
//!
//! - [`state`] - Pure precedence rules from inputs to volume/play
//! - [`media`] - The [`MediaHandle`]/[`MediaFactory`] seam and a simulated player
//! - [`coordinator`] - Per-item sessions and exactly-once side effects

mod coordinator;
mod media;
mod state;

pub use coordinator::{AttentionPulse, MediaStatus, PlaybackCoordinator};
pub use media::{MediaFactory, MediaHandle, MediaInitError, SimulatedFactory, SimulatedPlayer};
pub use state::{EffectiveState, PlaybackInputs, Volume};
