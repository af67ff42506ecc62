//! Decides which rendered item is "active".
//!
//! The active item is the lowest-index item whose visible fraction meets the
//! threshold. An empty window keeps the previous choice so playback does not
//! flicker during transitions. Identity is tracked by [`ItemId`] so that a
//! refreshed list keeps the same item active when it is still present.

use crate::feed::{ItemId, MediaItem};

/// Default fraction of an item that must be on screen to count as viewable.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Visible fraction of one rendered item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    pub index: usize,
    /// In `0.0..=1.0`.
    pub fraction: f32,
}

/// Snapshot of the rendered items and how much of each is on screen.
///
/// Recomputed on every scroll or layout event; never stored beyond that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportWindow {
    entries: Vec<Visibility>,
}

impl ViewportWindow {
    pub fn new(mut entries: Vec<Visibility>) -> Self {
        for entry in &mut entries {
            entry.fraction = if entry.fraction.is_nan() {
                0.0
            } else {
                entry.fraction.clamp(0.0, 1.0)
            };
        }
        entries.sort_by_key(|e| e.index);
        entries.dedup_by_key(|e| e.index);
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Window for a paged layout where each item fills one screen.
    ///
    /// `offset` is the scroll position in screens (1.5 = halfway between
    /// items 1 and 2). `overscan` extra items on each side are rendered with
    /// fraction 0.
    pub fn paged(offset: f32, len: usize, overscan: usize) -> Self {
        if len == 0 {
            return Self::empty();
        }
        let offset = offset.clamp(0.0, (len - 1) as f32);
        let first = offset.floor() as usize;
        let partial = offset - first as f32;

        let mut entries = Vec::new();
        let start = first.saturating_sub(overscan);
        let end = (first + 1 + overscan).min(len - 1);
        for index in start..=end {
            let fraction = if index == first {
                1.0 - partial
            } else if index == first + 1 {
                partial
            } else {
                0.0
            };
            entries.push(Visibility { index, fraction });
        }
        Self::new(entries)
    }

    /// Window for a grid of `columns` columns with `visible_rows` fully
    /// visible rows starting at `first_row`.
    pub fn grid(first_row: usize, visible_rows: usize, columns: usize, len: usize) -> Self {
        let columns = columns.max(1);
        let start = first_row.saturating_mul(columns).min(len);
        let end = first_row
            .saturating_add(visible_rows)
            .saturating_mul(columns)
            .min(len);
        Self::new(
            (start..end)
                .map(|index| Visibility {
                    index,
                    fraction: 1.0,
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[Visibility] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of every rendered item, visible or not.
    pub fn rendered(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.index)
    }
}

/// Change of the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

pub struct ViewabilityTracker {
    threshold: f32,
    active: Option<(usize, ItemId)>,
}

impl ViewabilityTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.01, 1.0),
            active: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.as_ref().map(|(i, _)| *i)
    }

    pub fn active_id(&self) -> Option<&ItemId> {
        self.active.as_ref().map(|(_, id)| id)
    }

    /// Process a viewport update.
    ///
    /// Returns the change if the active index moved.
    pub fn observe(&mut self, window: &ViewportWindow, items: &[MediaItem]) -> Option<ActiveChange> {
        let candidate = window
            .entries()
            .iter()
            .filter(|e| e.index < items.len())
            .find(|e| e.fraction >= self.threshold)
            .map(|e| e.index);

        match candidate {
            Some(index) => self.set(Some(index), items),
            // Nothing viewable: keep the current choice
            None => None,
        }
    }

    /// Reset to `target` (clamped), or to the first item.
    pub fn reset(&mut self, items: &[MediaItem], target: Option<usize>) -> Option<ActiveChange> {
        let index = if items.is_empty() {
            None
        } else {
            Some(target.unwrap_or(0).min(items.len() - 1))
        };
        self.set(index, items)
    }

    /// Re-resolve the active item after its list was replaced.
    ///
    /// Keeps the same item active (possibly at a new index) if it is still in
    /// the list; otherwise resets to the first item.
    pub fn reconcile(&mut self, items: &[MediaItem]) -> Option<ActiveChange> {
        let found = self
            .active
            .as_ref()
            .and_then(|(_, id)| items.iter().position(|item| &item.id == id));
        match found {
            Some(index) => self.set(Some(index), items),
            None => self.reset(items, None),
        }
    }

    /// Forget the active item entirely (list cleared or failed).
    pub fn clear(&mut self) -> Option<ActiveChange> {
        self.set(None, &[])
    }

    fn set(&mut self, index: Option<usize>, items: &[MediaItem]) -> Option<ActiveChange> {
        let previous = self.active_index();
        self.active = index.and_then(|i| items.get(i).map(|item| (i, item.id.clone())));
        let current = self.active_index();
        if previous == current {
            return None;
        }
        tracing::trace!(?previous, ?current, "Active index changed");
        Some(ActiveChange { previous, current })
    }
}

impl Default for ViewabilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}
