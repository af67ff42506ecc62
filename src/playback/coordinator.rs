use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::media::{MediaFactory, MediaHandle, MediaInitError};
use super::state::{EffectiveState, PlaybackInputs};
use crate::error::FeedError;
use crate::feed::{ItemId, MediaItem, MediaKind};

/// Attention pulse shown on an item's document badge while it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionPulse {
    elapsed: Duration,
}

impl AttentionPulse {
    const PERIOD: Duration = Duration::from_millis(1200);

    /// True during the first half of each period.
    pub fn is_lit(&self) -> bool {
        let phase = self.elapsed.as_millis() % Self::PERIOD.as_millis();
        phase < Self::PERIOD.as_millis() / 2
    }
}

/// Media state of an attached item, as seen by renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaStatus {
    /// Still image; nothing to play.
    Static,
    /// Initialization failed; the item renders without playback.
    Inert,
    Live {
        playing: bool,
        volume: f32,
        position: Option<Duration>,
    },
}

enum MediaSlot {
    Ready(Box<dyn MediaHandle>),
    Static,
    Inert(MediaInitError),
}

struct ItemSession {
    media: MediaSlot,
    muted: bool,
    active: bool,
    applied: Option<EffectiveState>,
    attention: Option<AttentionPulse>,
}

/// Turns active/focus/mute changes into player side effects.
///
/// Per-item state lives from [`attach`](Self::attach) to
/// [`detach`](Self::detach). Effects run only when an item's effective state
/// changes, and "ensure playing" never restarts a player that is already
/// running.
pub struct PlaybackCoordinator {
    factory: Box<dyn MediaFactory>,
    preload: bool,
    screen_focused: bool,
    active: Option<ItemId>,
    sessions: HashMap<ItemId, ItemSession>,
}

impl PlaybackCoordinator {
    /// `preload` starts every attached video silently so scrolling back to it
    /// does not pay startup latency.
    pub fn new(factory: Box<dyn MediaFactory>, preload: bool) -> Self {
        Self {
            factory,
            preload,
            screen_focused: true,
            active: None,
            sessions: HashMap::new(),
        }
    }

    pub fn is_screen_focused(&self) -> bool {
        self.screen_focused
    }

    pub fn is_attached(&self, id: &ItemId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn attached_count(&self) -> usize {
        self.sessions.len()
    }

    /// Start tracking `item`. Idempotent for an already attached item.
    pub fn attach(&mut self, item: &MediaItem) {
        if self.sessions.contains_key(&item.id) {
            return;
        }

        let media = match item.media_kind {
            MediaKind::Image => MediaSlot::Static,
            MediaKind::Video => match self.factory.create(item) {
                Ok(mut handle) => {
                    handle.set_looping(true);
                    MediaSlot::Ready(handle)
                }
                Err(e) => {
                    let error = FeedError::MediaInitFailed {
                        item: item.id.clone(),
                        source: e.clone(),
                    };
                    tracing::warn!(error = %error, "Item left inert");
                    MediaSlot::Inert(e)
                }
            },
        };

        let session = ItemSession {
            media,
            muted: false,
            active: self.active.as_ref() == Some(&item.id),
            applied: None,
            attention: item.has_document().then_some(AttentionPulse {
                elapsed: Duration::ZERO,
            }),
        };
        self.sessions.insert(item.id.clone(), session);
        tracing::trace!(item = %item.id, "Attached item");

        let preload = self.preload;
        let focused = self.screen_focused;
        if let Some(session) = self.sessions.get_mut(&item.id) {
            apply(&item.id, session, focused);
            if preload {
                if let MediaSlot::Ready(handle) = &mut session.media {
                    ensure_playing(handle.as_mut());
                }
            }
        }
    }

    /// Stop tracking `id`, releasing its player and stopping its pulse.
    /// The item's mute choice is forgotten.
    pub fn detach(&mut self, id: &ItemId) {
        if let Some(mut session) = self.sessions.remove(id) {
            if let MediaSlot::Ready(handle) = &mut session.media {
                handle.release();
            }
            session.attention = None;
            tracing::trace!(item = %id, "Detached item");
        }
    }

    pub fn detach_all(&mut self) {
        let ids: Vec<ItemId> = self.sessions.keys().cloned().collect();
        for id in ids {
            self.detach(&id);
        }
    }

    /// Attach exactly the items at `rendered`, detaching everything else.
    pub fn sync_rendered(&mut self, items: &[MediaItem], rendered: impl IntoIterator<Item = usize>) {
        let keep: Vec<&MediaItem> = rendered.into_iter().filter_map(|i| items.get(i)).collect();
        let keep_ids: HashSet<&ItemId> = keep.iter().map(|item| &item.id).collect();

        let stale: Vec<ItemId> = self
            .sessions
            .keys()
            .filter(|id| !keep_ids.contains(id))
            .cloned()
            .collect();
        for id in stale {
            self.detach(&id);
        }
        for item in keep {
            self.attach(item);
        }
    }

    /// Make `id` the single active item (or none).
    pub fn set_active(&mut self, id: Option<&ItemId>) {
        if self.active.as_ref() == id {
            return;
        }
        self.active = id.cloned();
        let focused = self.screen_focused;
        for (item_id, session) in self.sessions.iter_mut() {
            let active = self.active.as_ref() == Some(item_id);
            if session.active != active {
                session.active = active;
                apply(item_id, session, focused);
            }
        }
    }

    pub fn set_screen_focused(&mut self, focused: bool) {
        if self.screen_focused == focused {
            return;
        }
        self.screen_focused = focused;
        tracing::debug!(focused, "Screen focus changed");
        for (item_id, session) in self.sessions.iter_mut() {
            apply(item_id, session, focused);
        }
    }

    /// Flip the mute choice of an attached item. Returns the new value.
    pub fn toggle_mute(&mut self, id: &ItemId) -> Option<bool> {
        let focused = self.screen_focused;
        let session = self.sessions.get_mut(id)?;
        session.muted = !session.muted;
        tracing::debug!(item = %id, muted = session.muted, "Mute toggled");
        apply(id, session, focused);
        Some(session.muted)
    }

    pub fn is_muted(&self, id: &ItemId) -> Option<bool> {
        self.sessions.get(id).map(|s| s.muted)
    }

    pub fn inputs(&self, id: &ItemId) -> Option<PlaybackInputs> {
        self.sessions.get(id).map(|s| inputs(s, self.screen_focused))
    }

    pub fn effective(&self, id: &ItemId) -> Option<EffectiveState> {
        self.inputs(id).map(|i| i.resolve())
    }

    pub fn media_status(&self, id: &ItemId) -> Option<MediaStatus> {
        self.sessions.get(id).map(|s| match &s.media {
            MediaSlot::Static => MediaStatus::Static,
            MediaSlot::Inert(_) => MediaStatus::Inert,
            MediaSlot::Ready(handle) => MediaStatus::Live {
                playing: handle.is_playing(),
                volume: handle.volume(),
                position: handle.position(),
            },
        })
    }

    pub fn init_error(&self, id: &ItemId) -> Option<&MediaInitError> {
        match &self.sessions.get(id)?.media {
            MediaSlot::Inert(e) => Some(e),
            _ => None,
        }
    }

    pub fn attention(&self, id: &ItemId) -> Option<AttentionPulse> {
        self.sessions.get(id).and_then(|s| s.attention)
    }

    /// Advance attention pulses of attached items.
    pub fn tick(&mut self, dt: Duration) {
        for session in self.sessions.values_mut() {
            if let Some(pulse) = &mut session.attention {
                pulse.elapsed = pulse.elapsed.saturating_add(dt);
            }
        }
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.detach_all();
    }
}

fn inputs(session: &ItemSession, screen_focused: bool) -> PlaybackInputs {
    PlaybackInputs {
        is_active: session.active,
        is_screen_focused: screen_focused,
        is_user_muted: session.muted,
    }
}

/// Push the session's effective state to its player if it changed.
fn apply(id: &ItemId, session: &mut ItemSession, screen_focused: bool) {
    let state = inputs(session, screen_focused).resolve();
    if session.applied == Some(state) {
        return;
    }
    session.applied = Some(state);

    if let MediaSlot::Ready(handle) = &mut session.media {
        handle.set_volume(state.volume.as_f32());
        if state.should_play {
            ensure_playing(handle.as_mut());
        }
        tracing::trace!(item = %id, volume = state.volume.as_f32(), should_play = state.should_play, "Applied playback state");
    }
}

fn ensure_playing(handle: &mut dyn MediaHandle) {
    if !handle.is_playing() {
        handle.play();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{build_items, Category, FeedKind, FeedRecord};
    use crate::playback::Volume;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Volume(f32),
        Loop(bool),
        Play,
        Release,
    }

    #[derive(Default, Clone)]
    struct Recorder {
        calls: Arc<Mutex<HashMap<String, Vec<Call>>>>,
    }

    impl Recorder {
        fn calls(&self, id: &str) -> Vec<Call> {
            self.calls.lock().unwrap().get(id).cloned().unwrap_or_default()
        }

        fn count(&self, id: &str, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls(id).iter().filter(|c| pred(c)).count()
        }
    }

    struct FakeHandle {
        id: String,
        recorder: Recorder,
        playing: bool,
        volume: f32,
    }

    impl FakeHandle {
        fn log(&self, call: Call) {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .entry(self.id.clone())
                .or_default()
                .push(call);
        }
    }

    impl MediaHandle for FakeHandle {
        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
            self.log(Call::Volume(volume));
        }
        fn volume(&self) -> f32 {
            self.volume
        }
        fn set_looping(&mut self, looping: bool) {
            self.log(Call::Loop(looping));
        }
        fn play(&mut self) {
            self.playing = true;
            self.log(Call::Play);
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn release(&mut self) {
            self.playing = false;
            self.log(Call::Release);
        }
    }

    struct FakeFactory {
        recorder: Recorder,
        fail_for: Option<String>,
    }

    impl MediaFactory for FakeFactory {
        fn create(&self, item: &MediaItem) -> Result<Box<dyn MediaHandle>, MediaInitError> {
            if self.fail_for.as_deref() == Some(item.id.as_str()) {
                return Err(MediaInitError::Backend("decoder unavailable".into()));
            }
            Ok(Box::new(FakeHandle {
                id: item.id.to_string(),
                recorder: self.recorder.clone(),
                playing: false,
                volume: 0.0,
            }))
        }
    }

    fn items(kind: FeedKind, n: usize) -> Vec<MediaItem> {
        let records = (0..n)
            .map(|i| FeedRecord {
                id: Some(format!("v{i}")),
                user_id: Some(format!("u{i}")),
                file_url: Some(format!("https://cdn.example.com/{i}.mp4")),
                doc_file_url: (i == 0).then(|| "https://docs.example.com/a.pdf".to_string()),
                ..Default::default()
            })
            .collect();
        build_items(records, kind, Category::All).items
    }

    fn coordinator(preload: bool, fail_for: Option<&str>) -> (PlaybackCoordinator, Recorder) {
        let recorder = Recorder::default();
        let factory = FakeFactory {
            recorder: recorder.clone(),
            fail_for: fail_for.map(str::to_string),
        };
        (PlaybackCoordinator::new(Box::new(factory), preload), recorder)
    }

    fn volume(c: &PlaybackCoordinator, item: &MediaItem) -> Volume {
        c.effective(&item.id).unwrap().volume
    }

    #[test]
    fn test_active_item_full_volume_others_silent() {
        let list = items(FeedKind::Reels, 3);
        let (mut c, rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..3);
        c.set_active(Some(&list[1].id));

        assert_eq!(volume(&c, &list[0]), Volume::Silent);
        assert_eq!(volume(&c, &list[1]), Volume::Full);
        assert_eq!(volume(&c, &list[2]), Volume::Silent);
        assert!(rec.calls("v1").contains(&Call::Play));
        assert!(!rec.calls("v0").contains(&Call::Play));
        assert!(rec.calls("v0").contains(&Call::Loop(true)));
    }

    #[test]
    fn test_unfocus_silences_without_changing_active() {
        let list = items(FeedKind::Reels, 3);
        let (mut c, _rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..3);
        c.set_active(Some(&list[1].id));
        c.set_screen_focused(false);

        assert_eq!(volume(&c, &list[1]), Volume::Silent);
        assert!(c.inputs(&list[1].id).unwrap().is_active);

        c.set_screen_focused(true);
        assert_eq!(volume(&c, &list[1]), Volume::Full);
    }

    #[test]
    fn test_toggle_mute_round_trip() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..2);
        c.set_active(Some(&list[0].id));

        assert_eq!(c.toggle_mute(&list[0].id), Some(true));
        assert_eq!(volume(&c, &list[0]), Volume::Silent);
        assert_eq!(c.toggle_mute(&list[0].id), Some(false));
        assert_eq!(volume(&c, &list[0]), Volume::Full);
        assert_eq!(rec.calls("v0").last(), Some(&Call::Volume(1.0)));
    }

    #[test]
    fn test_effects_applied_once_per_change() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..2);
        c.set_active(Some(&list[0].id));
        c.set_active(Some(&list[0].id));
        c.sync_rendered(&list, 0..2);
        c.set_screen_focused(true);

        assert_eq!(rec.count("v0", |c| matches!(c, Call::Volume(_))), 2);
        assert_eq!(rec.count("v0", |c| *c == Call::Play), 1);
    }

    #[test]
    fn test_ensure_playing_does_not_restart() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(true, None);
        c.sync_rendered(&list, 0..2);
        // Preloaded: both already playing
        assert_eq!(rec.count("v0", |c| *c == Call::Play), 1);
        assert_eq!(rec.count("v1", |c| *c == Call::Play), 1);

        c.set_active(Some(&list[1].id));
        c.set_active(Some(&list[0].id));
        c.set_active(Some(&list[1].id));
        assert_eq!(rec.count("v1", |c| *c == Call::Play), 1);
    }

    #[test]
    fn test_mute_resets_on_reattach() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..1);
        c.set_active(Some(&list[0].id));
        c.toggle_mute(&list[0].id);

        c.sync_rendered(&list, 1..2);
        assert!(!c.is_attached(&list[0].id));
        assert!(rec.calls("v0").contains(&Call::Release));

        c.sync_rendered(&list, 0..2);
        assert_eq!(c.is_muted(&list[0].id), Some(false));
        assert_eq!(volume(&c, &list[0]), Volume::Full);
    }

    #[test]
    fn test_media_init_failure_is_contained() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(false, Some("v0"));
        c.sync_rendered(&list, 0..2);
        c.set_active(Some(&list[0].id));

        assert_eq!(c.media_status(&list[0].id), Some(MediaStatus::Inert));
        assert!(c.init_error(&list[0].id).is_some());
        assert!(rec.calls("v0").is_empty());

        c.set_active(Some(&list[1].id));
        assert!(rec.calls("v1").contains(&Call::Play));
    }

    #[test]
    fn test_images_have_no_player() {
        let list = items(FeedKind::Memes, 2);
        let (mut c, rec) = coordinator(true, None);
        c.sync_rendered(&list, 0..2);
        c.set_active(Some(&list[0].id));
        assert_eq!(c.media_status(&list[0].id), Some(MediaStatus::Static));
        assert_eq!(volume(&c, &list[0]), Volume::Full);
        assert!(rec.calls("v0").is_empty());
    }

    #[test]
    fn test_attention_pulse_lifecycle() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, _rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..2);
        assert!(c.attention(&list[0].id).unwrap().is_lit());
        assert!(c.attention(&list[1].id).is_none());

        c.tick(Duration::from_millis(700));
        assert!(!c.attention(&list[0].id).unwrap().is_lit());

        c.detach(&list[0].id);
        assert!(c.attention(&list[0].id).is_none());
    }

    #[test]
    fn test_detach_all_on_drop_releases_players() {
        let list = items(FeedKind::Reels, 2);
        let (mut c, rec) = coordinator(false, None);
        c.sync_rendered(&list, 0..2);
        drop(c);
        assert!(rec.calls("v0").contains(&Call::Release));
        assert!(rec.calls("v1").contains(&Call::Release));
    }
}
