//! Grid / full-screen presentation state machine.
//!
//! Two states, three externally triggered transitions, no timers:
//!
//! ```text
//!            select_item(i)
//!   Grid ─────────────────────▶ FullScreen
//!    ▲                              │
//!    └──── go_back / force_grid ────┘
//! ```

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    /// Multi-column thumbnail browser.
    #[default]
    Grid,
    /// One item per screen, paged vertically.
    FullScreen,
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentationMode::Grid => f.write_str("grid"),
            PresentationMode::FullScreen => f.write_str("full-screen"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("Already in full-screen mode")]
    AlreadyFullScreen,
    #[error("Not in full-screen mode")]
    NotFullScreen,
    #[error("Item {index} out of range (feed has {len} items)")]
    OutOfRange { index: usize, len: usize },
}

/// A completed transition and the active index the tracker must reset to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PresentationMode,
    pub to: PresentationMode,
    /// `Some(i)` when entering full-screen from a grid tap, `None` for the
    /// default reset to the first item.
    pub reset_to: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ModeSwitch {
    mode: PresentationMode,
}

impl ModeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    /// Grid → FullScreen on a tap of item `index`.
    pub fn select_item(&mut self, index: usize, len: usize) -> Result<Transition, ModeError> {
        if self.mode == PresentationMode::FullScreen {
            return Err(ModeError::AlreadyFullScreen);
        }
        if index >= len {
            return Err(ModeError::OutOfRange { index, len });
        }
        Ok(self.transition(PresentationMode::FullScreen, Some(index)))
    }

    /// FullScreen → Grid on an explicit back action.
    pub fn go_back(&mut self) -> Result<Transition, ModeError> {
        if self.mode != PresentationMode::FullScreen {
            return Err(ModeError::NotFullScreen);
        }
        Ok(self.transition(PresentationMode::Grid, None))
    }

    /// Leave full-screen ahead of a category change. No-op in grid mode.
    pub fn force_grid(&mut self) -> Option<Transition> {
        (self.mode == PresentationMode::FullScreen)
            .then(|| self.transition(PresentationMode::Grid, None))
    }

    fn transition(&mut self, to: PresentationMode, reset_to: Option<usize>) -> Transition {
        let from = self.mode;
        self.mode = to;
        tracing::debug!(%from, %to, ?reset_to, "Presentation mode changed");
        Transition { from, to, reset_to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_grid() {
        assert_eq!(ModeSwitch::new().mode(), PresentationMode::Grid);
    }

    #[test]
    fn test_select_item_carries_index() {
        let mut switch = ModeSwitch::new();
        let t = switch.select_item(3, 5).unwrap();
        assert_eq!(t.to, PresentationMode::FullScreen);
        assert_eq!(t.reset_to, Some(3));
        assert_eq!(switch.mode(), PresentationMode::FullScreen);
    }

    #[test]
    fn test_select_item_rejections() {
        let mut switch = ModeSwitch::new();
        assert_eq!(
            switch.select_item(5, 5),
            Err(ModeError::OutOfRange { index: 5, len: 5 })
        );
        switch.select_item(0, 5).unwrap();
        assert_eq!(switch.select_item(1, 5), Err(ModeError::AlreadyFullScreen));
    }

    #[test]
    fn test_go_back_resets_to_default() {
        let mut switch = ModeSwitch::new();
        assert_eq!(switch.go_back(), Err(ModeError::NotFullScreen));
        switch.select_item(2, 3).unwrap();
        let t = switch.go_back().unwrap();
        assert_eq!(t.to, PresentationMode::Grid);
        assert_eq!(t.reset_to, None);
    }

    #[test]
    fn test_force_grid_only_from_full_screen() {
        let mut switch = ModeSwitch::new();
        assert!(switch.force_grid().is_none());
        switch.select_item(1, 2).unwrap();
        assert_eq!(switch.force_grid().unwrap().from, PresentationMode::FullScreen);
        assert_eq!(switch.mode(), PresentationMode::Grid);
    }
}
