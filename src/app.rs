//! Terminal front-end state.
//!
//! [`App`] wraps the [`FeedController`] with the bits only the terminal needs:
//! grid cursor and scroll, the animated full-screen scroll offset, and a
//! transient status line.

use std::borrow::Cow;
use tokio::time::Instant;

use crate::controller::{FeedController, FeedEvent};
use crate::feed::{Category, RemoteApi};
use crate::mode::PresentationMode;
use crate::viewability::ViewportWindow;

/// Full-screen scroll distance covered per tick, in screens.
const SCROLL_STEP: f32 = 0.5;

/// Items rendered beyond the visible page on each side in full-screen mode.
const OVERSCAN: usize = 1;

pub struct App<A: RemoteApi> {
    pub feed: FeedController<A>,
    /// Grid selection.
    pub cursor: usize,
    /// First grid row on screen.
    pub first_row: usize,
    pub grid_columns: usize,
    /// Grid rows that fit on screen; updated by the renderer.
    pub visible_rows: usize,
    /// Full-screen scroll position in screens (fractional while animating).
    pub scroll_offset: f32,
    /// Page the full-screen scroll is moving toward.
    pub target_page: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl<A: RemoteApi> App<A> {
    pub fn new(feed: FeedController<A>, grid_columns: usize) -> Self {
        Self {
            feed,
            cursor: 0,
            first_row: 0,
            grid_columns: grid_columns.max(1),
            visible_rows: 1,
            scroll_offset: 0.0,
            target_page: 0,
            status_message: None,
            needs_redraw: true,
        }
    }

    fn len(&self) -> usize {
        self.feed.items().len()
    }

    /// Current viewport as the renderer lays it out.
    pub fn viewport(&self) -> ViewportWindow {
        match self.feed.mode() {
            PresentationMode::Grid => ViewportWindow::grid(
                self.first_row,
                self.visible_rows,
                self.grid_columns,
                self.len(),
            ),
            PresentationMode::FullScreen => {
                ViewportWindow::paged(self.scroll_offset, self.len(), OVERSCAN)
            }
        }
    }

    /// Report the current viewport to the controller.
    pub fn sync_viewport(&mut self) {
        let window = self.viewport();
        self.feed.observe_viewport(&window);
    }

    // ------------------------------------------------------------------------
    // Grid navigation
    // ------------------------------------------------------------------------

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let max_index = len - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(max_index);
        self.ensure_cursor_visible();
    }

    pub fn nav_down(&mut self) {
        self.move_cursor(self.grid_columns as isize);
    }

    pub fn nav_up(&mut self) {
        self.move_cursor(-(self.grid_columns as isize));
    }

    pub fn nav_right(&mut self) {
        self.move_cursor(1);
    }

    pub fn nav_left(&mut self) {
        self.move_cursor(-1);
    }

    fn ensure_cursor_visible(&mut self) {
        let row = self.cursor / self.grid_columns;
        let visible = self.visible_rows.max(1);
        if row < self.first_row {
            self.first_row = row;
        } else if row >= self.first_row + visible {
            self.first_row = row + 1 - visible;
        }
    }

    // ------------------------------------------------------------------------
    // Full-screen navigation
    // ------------------------------------------------------------------------

    pub fn page_down(&mut self) {
        let len = self.len();
        if len > 0 {
            self.target_page = (self.target_page + 1).min(len - 1);
        }
    }

    pub fn page_up(&mut self) {
        self.target_page = self.target_page.saturating_sub(1);
    }

    /// Move the scroll offset one step toward the target page.
    /// Returns true if it moved.
    pub fn animate_scroll(&mut self) -> bool {
        let target = self.target_page as f32;
        let distance = target - self.scroll_offset;
        if distance.abs() < f32::EPSILON {
            return false;
        }
        self.scroll_offset = if distance.abs() <= SCROLL_STEP {
            target
        } else {
            self.scroll_offset + SCROLL_STEP * distance.signum()
        };
        true
    }

    // ------------------------------------------------------------------------
    // Feed actions
    // ------------------------------------------------------------------------

    /// Apply a background result, keeping the pager on the active item when a
    /// refreshed listing moved it.
    pub fn handle_feed_event(&mut self, event: FeedEvent) {
        let before = self.feed.active_index();
        self.feed.handle_event(event);
        self.needs_redraw = true;

        self.cursor = self.cursor.min(self.len().saturating_sub(1));
        if self.feed.mode() == PresentationMode::FullScreen {
            if let Some(active) = self.feed.active_index().filter(|a| Some(*a) != before) {
                self.target_page = active;
                self.scroll_offset = active as f32;
            }
        }
    }

    /// Grid → full-screen at the cursor.
    pub fn enter(&mut self) {
        match self.feed.select_item(self.cursor) {
            Ok(()) => {
                self.target_page = self.cursor;
                self.scroll_offset = self.cursor as f32;
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring select"),
        }
    }

    /// Full-screen → grid, back at the top.
    pub fn back(&mut self) {
        if self.feed.go_back().is_ok() {
            self.reset_positions();
        }
    }

    pub fn select_category(&mut self, category: Category) {
        self.feed.select(category);
        self.reset_positions();
    }

    pub fn next_category(&mut self) {
        self.select_category(self.feed.category().next());
    }

    pub fn prev_category(&mut self) {
        self.select_category(self.feed.category().prev());
    }

    pub fn refresh(&mut self) {
        self.feed.refresh();
        self.reset_positions();
        self.set_status(format!("Refreshing {}", self.feed.category()));
    }

    pub fn toggle_mute(&mut self) {
        let Some(index) = self.feed.active_index() else {
            return;
        };
        match self.feed.toggle_mute(index) {
            Some(true) => self.set_status("Muted"),
            Some(false) => self.set_status("Unmuted"),
            None => {}
        }
    }

    pub fn toggle_focus(&mut self) {
        let focused = !self.feed.is_screen_focused();
        self.feed.set_screen_focused(focused);
        self.set_status(if focused { "Resumed" } else { "Paused" });
    }

    /// Open the document of the selected (grid) or active (full-screen) item.
    pub fn open_document(&mut self) {
        let index = match self.feed.mode() {
            PresentationMode::Grid => Some(self.cursor),
            PresentationMode::FullScreen => self.feed.active_index(),
        };
        if let Some(index) = index {
            if self.feed.open_document(index).is_ok() {
                self.set_status("Opened document in browser");
            }
        }
        if let Some(notice) = self.feed.take_notice() {
            self.set_status(notice);
        }
    }

    fn reset_positions(&mut self) {
        self.cursor = 0;
        self.first_row = 0;
        self.scroll_offset = 0.0;
        self.target_page = 0;
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
