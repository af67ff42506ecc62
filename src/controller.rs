//! Feed orchestration and the exposed control surface.
//!
//! [`FeedController`] owns every piece of feed state and is mutated only from
//! the event loop. Network work is spawned onto tokio tasks that perform I/O
//! and nothing else; results come back as [`FeedEvent`]s through an mpsc
//! channel and are applied by [`FeedController::handle_event`].
//!
//! Observers read a [`FeedView`] snapshot through [`FeedController::subscribe`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::author::{AuthorMetadata, AuthorResolver};
use crate::cache::{CachePolicy, CategoryCache, FetchKind, FetchOutcome, FetchTicket};
use crate::document::{self, LinkOpener, SystemOpener};
use crate::error::FeedError;
use crate::feed::{
    AuthorId, Category, FeedKind, FetchError, MediaItem, ProfileRecord, RemoteApi,
    UnknownCategory,
};
use crate::mode::{ModeError, ModeSwitch, PresentationMode};
use crate::playback::{
    AttentionPulse, EffectiveState, MediaFactory, MediaStatus, PlaybackCoordinator,
    PlaybackInputs, SimulatedFactory,
};
use crate::viewability::{ViewabilityTracker, ViewportWindow, DEFAULT_VISIBILITY_THRESHOLD};

// ============================================================================
// Events and Snapshots
// ============================================================================

/// Completion of a background task.
#[derive(Debug)]
pub enum FeedEvent {
    /// A listing fetch finished.
    ///
    /// Fields:
    /// - `ticket`: The cache ticket the fetch was issued under
    /// - `result`: Parsed items or the fetch error
    FeedLoaded {
        ticket: FetchTicket,
        result: Result<Vec<MediaItem>, FetchError>,
    },
    /// A profile lookup finished.
    AuthorLoaded {
        author_id: AuthorId,
        result: Result<ProfileRecord, FetchError>,
    },
}

/// Load state of the selected category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    /// Cold fetch outstanding, nothing to show yet.
    Loading,
    Ready,
    /// Cold fetch failed. Rendered as an empty/error feed.
    Failed(String),
}

/// Read-only snapshot published after every state change.
#[derive(Debug, Clone)]
pub struct FeedView {
    pub category: Category,
    pub kind: FeedKind,
    pub mode: PresentationMode,
    pub items: Arc<Vec<MediaItem>>,
    pub active_index: Option<usize>,
    pub status: FeedStatus,
}

impl FeedView {
    fn initial(kind: FeedKind, category: Category) -> Self {
        Self {
            category,
            kind,
            mode: PresentationMode::Grid,
            items: Arc::new(Vec::new()),
            active_index: None,
            status: FeedStatus::Idle,
        }
    }
}

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub kind: FeedKind,
    pub cache: CachePolicy,
    pub visibility_threshold: f32,
    /// Start every attached video silently, not only the active one.
    pub preload: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            kind: FeedKind::Reels,
            cache: CachePolicy::default(),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            preload: true,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct FeedController<A: RemoteApi> {
    api: A,
    kind: FeedKind,
    cache: CategoryCache,
    tracker: ViewabilityTracker,
    playback: PlaybackCoordinator,
    mode: ModeSwitch,
    authors: AuthorResolver,
    opener: Box<dyn LinkOpener>,
    event_tx: mpsc::Sender<FeedEvent>,
    view_tx: watch::Sender<FeedView>,
    category: Category,
    items: Arc<Vec<MediaItem>>,
    status: FeedStatus,
    notice: Option<String>,
    preload: bool,
}

impl<A: RemoteApi> FeedController<A> {
    /// Create a controller that reports background results on `event_tx`.
    ///
    /// Uses the simulated media backend and the system link opener; swap them
    /// with [`with_media_factory`](Self::with_media_factory) and
    /// [`with_link_opener`](Self::with_link_opener).
    pub fn new(api: A, options: ControllerOptions, event_tx: mpsc::Sender<FeedEvent>) -> Self {
        let (view_tx, _) = watch::channel(FeedView::initial(options.kind, Category::All));
        Self {
            api,
            kind: options.kind,
            cache: CategoryCache::new(options.cache),
            tracker: ViewabilityTracker::new(options.visibility_threshold),
            playback: PlaybackCoordinator::new(Box::new(SimulatedFactory::default()), options.preload),
            mode: ModeSwitch::new(),
            authors: AuthorResolver::new(),
            opener: Box::new(SystemOpener),
            event_tx,
            view_tx,
            category: Category::All,
            items: Arc::new(Vec::new()),
            status: FeedStatus::Idle,
            notice: None,
            preload: options.preload,
        }
    }

    /// Replace the media backend. Call before the first item is attached.
    pub fn with_media_factory(mut self, factory: Box<dyn MediaFactory>) -> Self {
        self.playback = PlaybackCoordinator::new(factory, self.preload);
        self
    }

    pub fn with_link_opener(mut self, opener: Box<dyn LinkOpener>) -> Self {
        self.opener = opener;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view_tx.subscribe()
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode.mode()
    }

    pub fn items(&self) -> &Arc<Vec<MediaItem>> {
        &self.items
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn active_index(&self) -> Option<usize> {
        self.tracker.active_index()
    }

    pub fn is_screen_focused(&self) -> bool {
        self.playback.is_screen_focused()
    }

    /// Author of the item at `index`: resolved metadata, or the placeholder
    /// while the lookup is outstanding.
    pub fn author(&self, index: usize) -> Option<AuthorMetadata> {
        let item = self.items.get(index)?;
        Some(
            self.authors
                .get(&item.author_id)
                .cloned()
                .unwrap_or_else(|| AuthorMetadata::placeholder(&item.author_id)),
        )
    }

    /// Effective playback state of the item at `index`, if it is attached.
    pub fn effective(&self, index: usize) -> Option<EffectiveState> {
        self.playback.effective(&self.items.get(index)?.id)
    }

    pub fn inputs(&self, index: usize) -> Option<PlaybackInputs> {
        self.playback.inputs(&self.items.get(index)?.id)
    }

    pub fn media_status(&self, index: usize) -> Option<MediaStatus> {
        self.playback.media_status(&self.items.get(index)?.id)
    }

    pub fn is_muted(&self, index: usize) -> Option<bool> {
        self.playback.is_muted(&self.items.get(index)?.id)
    }

    pub fn attention(&self, index: usize) -> Option<AttentionPulse> {
        self.playback.attention(&self.items.get(index)?.id)
    }

    /// One-shot user-facing message, cleared on read.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Select a category by its display name.
    pub fn select_category(&mut self, name: &str) -> Result<(), UnknownCategory> {
        let category: Category = name.parse()?;
        self.select(category);
        Ok(())
    }

    /// Select `category`.
    ///
    /// Leaves full-screen first, serves whatever the cache holds right away
    /// and spawns a fetch when the cache asks for one. The active index
    /// resets to the first item.
    pub fn select(&mut self, category: Category) {
        if let Some(t) = self.mode.force_grid() {
            tracing::debug!(from = %t.from, "Leaving full-screen for category change");
        }
        if category != self.category {
            tracing::info!(from = %self.category, to = %category, "Category selected");
        }
        self.category = category;

        let lookup = self.cache.get(category);
        match lookup.entry {
            Some(entry) => {
                self.items = Arc::clone(&entry.items);
                self.status = FeedStatus::Ready;
            }
            None => {
                self.items = Arc::new(Vec::new());
                self.status = FeedStatus::Loading;
            }
        }
        if let Some(ticket) = lookup.fetch {
            self.spawn_fetch(ticket);
        }

        // Items of the previous category are no longer rendered
        self.playback.detach_all();
        self.tracker.reset(&self.items, None);
        self.playback.set_active(self.tracker.active_id());
        self.publish();
    }

    /// Drop the cached listing for the current category and fetch it again.
    pub fn refresh(&mut self) {
        self.cache.invalidate(self.category);
        self.select(self.category);
    }

    /// Grid tap: enter full-screen with `index` active.
    pub fn select_item(&mut self, index: usize) -> Result<(), ModeError> {
        let transition = self.mode.select_item(index, self.items.len())?;
        self.tracker.reset(&self.items, transition.reset_to);
        self.playback.set_active(self.tracker.active_id());
        self.publish();
        Ok(())
    }

    /// Back action: full-screen to grid, active index reset to the first
    /// item.
    pub fn go_back(&mut self) -> Result<(), ModeError> {
        let transition = self.mode.go_back()?;
        self.tracker.reset(&self.items, transition.reset_to);
        self.playback.set_active(self.tracker.active_id());
        self.publish();
        Ok(())
    }

    /// Flip the mute choice of the item at `index`. Returns the new value,
    /// or `None` when the item is not attached.
    pub fn toggle_mute(&mut self, index: usize) -> Option<bool> {
        let id = self.items.get(index)?.id.clone();
        self.playback.toggle_mute(&id)
    }

    pub fn set_screen_focused(&mut self, focused: bool) {
        self.playback.set_screen_focused(focused);
    }

    /// Apply a viewport update from the renderer.
    ///
    /// Attaches the rendered items (detaching the rest), recomputes the active
    /// item and requests author metadata for rendered items not seen before.
    pub fn observe_viewport(&mut self, window: &ViewportWindow) {
        let items = Arc::clone(&self.items);
        self.playback.sync_rendered(&items, window.rendered());

        let changed = self.tracker.observe(window, &items).is_some();
        self.playback.set_active(self.tracker.active_id());

        for item in window.rendered().filter_map(|i| items.get(i)) {
            if let Some(author_id) = self.authors.request(&item.author_id) {
                self.spawn_author_lookup(author_id);
            }
        }

        if changed {
            self.publish();
        }
    }

    /// Open the document attached to the item at `index`.
    ///
    /// Failures are returned and also left as a notice for the UI.
    pub fn open_document(&mut self, index: usize) -> Result<(), FeedError> {
        let link = self
            .items
            .get(index)
            .and_then(|item| item.document_url.as_deref());
        let result = document::open_document(self.opener.as_ref(), link).map_err(FeedError::from);
        if let Err(e) = &result {
            tracing::warn!(index, error = %e, "Document link not opened");
            self.notice = Some(e.to_string());
        }
        result
    }

    /// Advance time-based presentation state.
    pub fn tick(&mut self, dt: Duration) {
        self.playback.tick(dt);
    }

    /// Apply the result of a background task.
    pub fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::FeedLoaded { ticket, result } => self.handle_feed_loaded(ticket, result),
            FeedEvent::AuthorLoaded { author_id, result } => {
                let metadata = self.authors.complete(&author_id, result);
                tracing::debug!(
                    author = %author_id,
                    name = %metadata.display_name,
                    placeholder = metadata.is_placeholder,
                    "Author resolved"
                );
            }
        }
    }

    fn handle_feed_loaded(&mut self, ticket: FetchTicket, result: Result<Vec<MediaItem>, FetchError>) {
        let outcome = self.cache.complete(ticket, result);
        let selected = ticket.category == self.category;

        match outcome {
            FetchOutcome::Applied(entry) => {
                if !selected {
                    tracing::debug!(
                        category = %ticket.category,
                        selected = %self.category,
                        "Cached listing for a category that is no longer selected"
                    );
                    return;
                }
                tracing::info!(category = %ticket.category, items = entry.items.len(), "Feed loaded");
                self.items = Arc::clone(&entry.items);
                self.status = FeedStatus::Ready;

                // Keep sessions of items that survived the refresh
                let items = Arc::clone(&self.items);
                let still_rendered: Vec<usize> = items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| self.playback.is_attached(&item.id))
                    .map(|(i, _)| i)
                    .collect();
                self.playback.sync_rendered(&items, still_rendered);
                self.tracker.reconcile(&items);
                self.playback.set_active(self.tracker.active_id());
                self.publish();
            }
            FetchOutcome::Discarded => {}
            FetchOutcome::ColdFailed(source) => {
                let error = FeedError::FetchFailed {
                    category: ticket.category,
                    source,
                };
                tracing::warn!(error = %error, seq = ticket.seq, kind = ?ticket.kind, "Feed fetch failed");
                if !selected {
                    return;
                }
                // Items served before the entry expired stay on screen
                if ticket.kind == FetchKind::Background && self.status == FeedStatus::Ready {
                    return;
                }
                self.items = Arc::new(Vec::new());
                self.status = FeedStatus::Failed(error.to_string());
                self.playback.detach_all();
                self.tracker.clear();
                self.playback.set_active(None);
                self.publish();
            }
            FetchOutcome::RefreshFailed { stale, error } => {
                let error = FeedError::RefreshFailed {
                    category: ticket.category,
                    source: error,
                };
                tracing::warn!(error = %error, stale_items = stale.items.len(), "Keeping stale listing");
            }
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let api = self.api.clone();
        let kind = self.kind;
        let tx = self.event_tx.clone();

        tracing::debug!(category = %ticket.category, seq = ticket.seq, kind = ?ticket.kind, "Spawning feed fetch");

        tokio::spawn(async move {
            let result = api.fetch_feed(kind, ticket.category).await;
            if let Err(e) = tx.send(FeedEvent::FeedLoaded { ticket, result }).await {
                tracing::warn!(error = %e, "Failed to send feed result (receiver dropped)");
            }
        });
    }

    fn spawn_author_lookup(&self, author_id: AuthorId) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = api.fetch_profile(author_id.as_str()).await;
            if let Err(e) = tx.send(FeedEvent::AuthorLoaded { author_id, result }).await {
                tracing::warn!(error = %e, "Failed to send profile result (receiver dropped)");
            }
        });
    }

    fn publish(&self) {
        self.view_tx.send_replace(FeedView {
            category: self.category,
            kind: self.kind,
            mode: self.mode.mode(),
            items: Arc::clone(&self.items),
            active_index: self.tracker.active_index(),
            status: self.status.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{build_items, FeedRecord};
    use crate::playback::Volume;
    use crate::viewability::Visibility;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct FakeApi {
        feed_calls: Arc<AtomicUsize>,
        profile_calls: Arc<AtomicUsize>,
        fail_feeds: Arc<Mutex<bool>>,
    }

    impl RemoteApi for FakeApi {
        async fn fetch_feed(&self, kind: FeedKind, category: Category) -> Result<Vec<MediaItem>, FetchError> {
            self.feed_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_feeds.lock().unwrap() {
                return Err(FetchError::HttpStatus(500));
            }
            let records = (0..4)
                .map(|i| FeedRecord {
                    id: Some(format!("{category}-{i}")),
                    user_id: Some(format!("author{i}")),
                    file_url: Some(format!("https://cdn.example.com/{i}.mp4")),
                    doc_file_url: (i == 0).then(|| "https://docs.example.com/0.pdf".to_string()),
                    ..Default::default()
                })
                .collect();
            Ok(build_items(records, kind, category).items)
        }

        async fn fetch_profile(&self, _author_id: &str) -> Result<ProfileRecord, FetchError> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::HttpStatus(404))
        }
    }

    fn controller() -> (FeedController<FakeApi>, mpsc::Receiver<FeedEvent>, FakeApi) {
        let api = FakeApi::default();
        let (tx, rx) = mpsc::channel(16);
        let options = ControllerOptions {
            preload: false,
            ..Default::default()
        };
        (FeedController::new(api.clone(), options, tx), rx, api)
    }

    async fn pump(controller: &mut FeedController<FakeApi>, rx: &mut mpsc::Receiver<FeedEvent>) {
        let event = rx.recv().await.unwrap();
        controller.handle_event(event);
    }

    #[tokio::test]
    async fn test_cold_select_loads_and_publishes() {
        let (mut c, mut rx, api) = controller();
        let view = c.subscribe();
        c.select_category("music").unwrap();
        assert_eq!(*c.status(), FeedStatus::Loading);
        pump(&mut c, &mut rx).await;

        let snapshot = view.borrow().clone();
        assert_eq!(snapshot.category, Category::Music);
        assert_eq!(snapshot.items.len(), 4);
        assert_eq!(snapshot.active_index, Some(0));
        assert_eq!(snapshot.status, FeedStatus::Ready);
        assert_eq!(api.feed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let (mut c, _rx, api) = controller();
        assert!(c.select_category("Gardening").is_err());
        assert_eq!(api.feed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_screen_entry_and_back() {
        let (mut c, mut rx, _api) = controller();
        c.select(Category::Food);
        pump(&mut c, &mut rx).await;

        c.select_item(3).unwrap();
        assert_eq!(c.mode(), PresentationMode::FullScreen);
        assert_eq!(c.active_index(), Some(3));
        assert_eq!(c.select_item(1), Err(ModeError::AlreadyFullScreen));

        c.go_back().unwrap();
        assert_eq!(c.mode(), PresentationMode::Grid);
        assert_eq!(c.active_index(), Some(0));
    }

    #[tokio::test]
    async fn test_category_change_leaves_full_screen() {
        let (mut c, mut rx, _api) = controller();
        c.select(Category::Food);
        pump(&mut c, &mut rx).await;
        c.select_item(2).unwrap();

        c.select(Category::Travel);
        assert_eq!(c.mode(), PresentationMode::Grid);
        assert_eq!(c.category(), Category::Travel);
    }

    #[tokio::test]
    async fn test_response_for_unselected_category_not_shown() {
        let (mut c, mut rx, _api) = controller();
        c.select(Category::Food);
        c.select(Category::Travel);
        pump(&mut c, &mut rx).await;
        pump(&mut c, &mut rx).await;
        assert_eq!(c.category(), Category::Travel);
        assert!(c.items().iter().all(|i| i.category == Category::Travel));
    }

    #[tokio::test]
    async fn test_viewport_drives_playback_and_author_lookups() {
        let (mut c, mut rx, api) = controller();
        c.select(Category::Comedy);
        pump(&mut c, &mut rx).await;

        c.observe_viewport(&ViewportWindow::new(vec![
            Visibility { index: 0, fraction: 0.2 },
            Visibility { index: 1, fraction: 0.8 },
        ]));
        assert_eq!(c.active_index(), Some(1));
        assert_eq!(c.effective(1).unwrap().volume, Volume::Full);
        assert_eq!(c.effective(0).unwrap().volume, Volume::Silent);
        assert!(c.effective(2).is_none());

        // Same authors again: no new lookups
        c.observe_viewport(&ViewportWindow::new(vec![Visibility { index: 1, fraction: 1.0 }]));
        pump(&mut c, &mut rx).await;
        pump(&mut c, &mut rx).await;
        assert_eq!(api.profile_calls.load(Ordering::SeqCst), 2);
        assert_eq!(c.author(1).unwrap().display_name, "user_autho");
    }

    #[tokio::test]
    async fn test_mute_and_focus() {
        let (mut c, mut rx, _api) = controller();
        c.select(Category::Music);
        pump(&mut c, &mut rx).await;
        c.observe_viewport(&ViewportWindow::paged(0.0, 4, 1));

        assert_eq!(c.toggle_mute(0), Some(true));
        assert_eq!(c.effective(0).unwrap().volume, Volume::Silent);
        assert_eq!(c.toggle_mute(0), Some(false));
        assert_eq!(c.effective(0).unwrap().volume, Volume::Full);

        c.set_screen_focused(false);
        assert_eq!(c.effective(0).unwrap().volume, Volume::Silent);
        assert!(!c.effective(0).unwrap().should_play);
        assert_eq!(c.toggle_mute(3), None);
    }

    #[tokio::test]
    async fn test_cold_failure_sets_failed_status() {
        let (mut c, mut rx, api) = controller();
        *api.fail_feeds.lock().unwrap() = true;
        c.select(Category::News);
        pump(&mut c, &mut rx).await;
        assert!(matches!(c.status(), FeedStatus::Failed(msg) if msg.contains("News")));
        assert!(c.items().is_empty());
        assert_eq!(c.active_index(), None);
    }

    #[tokio::test]
    async fn test_open_document_failure_leaves_notice() {
        let (mut c, mut rx, _api) = controller();
        c.select(Category::Education);
        pump(&mut c, &mut rx).await;

        assert!(c.open_document(1).is_err());
        let notice = c.take_notice().unwrap();
        assert!(notice.contains("no document"));
        assert!(c.take_notice().is_none());
    }
}
