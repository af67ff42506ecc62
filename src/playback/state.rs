//! Pure mapping from playback inputs to the effective volume/play state.

/// Output volume. Only two levels exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    Silent,
    Full,
}

impl Volume {
    pub fn as_f32(self) -> f32 {
        match self {
            Volume::Silent => 0.0,
            Volume::Full => 1.0,
        }
    }
}

/// Everything that decides how one item should sound and whether it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackInputs {
    pub is_active: bool,
    pub is_screen_focused: bool,
    pub is_user_muted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveState {
    pub volume: Volume,
    /// The item must be playing. `false` does not mean "pause": inactive
    /// items are only silenced.
    pub should_play: bool,
}

impl PlaybackInputs {
    /// Collapse the inputs. Precedence: unfocused screen, then inactive,
    /// then the user's mute choice.
    pub fn resolve(&self) -> EffectiveState {
        let volume = if !self.is_screen_focused || !self.is_active || self.is_user_muted {
            Volume::Silent
        } else {
            Volume::Full
        };
        EffectiveState {
            volume,
            should_play: self.is_active && self.is_screen_focused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(is_active: bool, is_screen_focused: bool, is_user_muted: bool) -> PlaybackInputs {
        PlaybackInputs {
            is_active,
            is_screen_focused,
            is_user_muted,
        }
    }

    #[test]
    fn test_unfocused_screen_is_always_silent() {
        for active in [true, false] {
            for muted in [true, false] {
                let state = inputs(active, false, muted).resolve();
                assert_eq!(state.volume, Volume::Silent);
                assert!(!state.should_play);
            }
        }
    }

    #[test]
    fn test_inactive_is_silent_and_not_forced_to_play() {
        let state = inputs(false, true, false).resolve();
        assert_eq!(state.volume, Volume::Silent);
        assert!(!state.should_play);
    }

    #[test]
    fn test_active_unmuted_is_full_volume() {
        let state = inputs(true, true, false).resolve();
        assert_eq!(state.volume, Volume::Full);
        assert!(state.should_play);
    }

    #[test]
    fn test_active_muted_plays_silently() {
        let state = inputs(true, true, true).resolve();
        assert_eq!(state.volume, Volume::Silent);
        assert!(state.should_play);
    }

    #[test]
    fn test_volume_levels() {
        assert_eq!(Volume::Silent.as_f32(), 0.0);
        assert_eq!(Volume::Full.as_f32(), 1.0);
    }
}
