//! Terminal User Interface module.
//!
//! - Main event loop (`run`)
//! - Input handling for grid and full-screen modes
//! - Rendering for the category strip, grid, pager and status bar
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `render` - View rendering dispatch
//! - `helpers` - Shared item-card formatting
//! - `categories` - Category strip widget
//! - `grid` - Grid widget
//! - `player` - Full-screen pager widget
//! - `status` - Status bar widget

mod categories;
mod grid;
mod helpers;
mod input;
mod loop_runner;
mod player;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
