//! Per-category memoization of feed listings.
//!
//! The cache never performs I/O itself. [`CategoryCache::get`] answers
//! synchronously with whatever it holds and, when the network must be
//! consulted, hands out a [`FetchTicket`]. The caller runs the fetch and
//! reports back with [`CategoryCache::complete`]; tickets carry a
//! per-category sequence number so a superseded response can never replace a
//! newer one.
//!
//! Freshness:
//!
//! | entry age                      | served | network             |
//! |--------------------------------|--------|---------------------|
//! | `< stale_after`                | yes    | none                |
//! | `stale_after ..= evict_after`  | yes    | background refresh  |
//! | `> evict_after`                | no     | cold fetch          |

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::feed::{Category, FetchError, MediaItem};

/// Default age after which an entry is revalidated in the background.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);
/// Default age after which an entry is discarded.
pub const DEFAULT_EVICT_AFTER: Duration = Duration::from_secs(10 * 60);
/// Default bound on the number of categories held at once.
pub const DEFAULT_MAX_CATEGORIES: usize = 32;

/// Cached listing for one category. Replaced wholesale, never mutated.
#[derive(Debug)]
pub struct CacheEntry {
    pub category: Category,
    /// Shared with the view; `Arc` makes handing it out O(1).
    pub items: Arc<Vec<MediaItem>>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}

/// Whether a ticket was issued with no data to show, or to revalidate data
/// that is already being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Cold,
    Background,
}

/// Permission to run one network fetch for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub category: Category,
    pub seq: u64,
    pub kind: FetchKind,
}

/// Answer to [`CategoryCache::get`].
#[derive(Debug)]
pub struct CacheGet {
    /// Last-known entry, fresh or stale.
    pub entry: Option<Arc<CacheEntry>>,
    /// Set when the caller should start a fetch.
    pub fetch: Option<FetchTicket>,
}

/// What [`CategoryCache::complete`] did with a response.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The entry was replaced.
    Applied(Arc<CacheEntry>),
    /// A newer ticket exists for this category; the response was dropped.
    Discarded,
    /// A fetch failed and no entry exists, either because the fetch was cold
    /// or because the stale entry was evicted while the refresh ran.
    ColdFailed(FetchError),
    /// A background refresh failed; the stale entry keeps being served.
    RefreshFailed {
        stale: Arc<CacheEntry>,
        error: FetchError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub stale_after: Duration,
    pub evict_after: Duration,
    pub max_categories: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            evict_after: DEFAULT_EVICT_AFTER,
            max_categories: DEFAULT_MAX_CATEGORIES,
        }
    }
}

#[derive(Debug, Default)]
struct SeqState {
    /// Highest sequence number issued for the category.
    latest: u64,
    /// Sequence of the fetch still outstanding, if any.
    in_flight: Option<u64>,
}

/// In-memory category cache with stale-while-revalidate semantics.
pub struct CategoryCache {
    policy: CachePolicy,
    entries: LruCache<Category, Arc<CacheEntry>>,
    seqs: HashMap<Category, SeqState>,
}

impl CategoryCache {
    pub fn new(policy: CachePolicy) -> Self {
        let capacity = NonZeroUsize::new(policy.max_categories.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            policy,
            entries: LruCache::new(capacity),
            seqs: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `category` at the current instant.
    pub fn get(&mut self, category: Category) -> CacheGet {
        self.get_at(category, Instant::now())
    }

    /// Look up `category` as of `now`.
    ///
    /// Returns the held entry (even if stale) and, when needed, a ticket for
    /// a cold or background fetch. No ticket is issued while one is already
    /// outstanding for the category.
    pub fn get_at(&mut self, category: Category, now: Instant) -> CacheGet {
        self.purge_expired(now);

        let entry = self.entries.get(&category).cloned();
        let needs_fetch = match &entry {
            None => Some(FetchKind::Cold),
            Some(e) if e.age(now) > self.policy.stale_after => Some(FetchKind::Background),
            Some(_) => None,
        };

        let fetch = needs_fetch.and_then(|kind| {
            let state = self.seqs.entry(category).or_default();
            if let Some(seq) = state.in_flight {
                tracing::debug!(category = %category, seq, "Fetch already in flight, not reissuing");
                return None;
            }
            state.latest += 1;
            state.in_flight = Some(state.latest);
            tracing::debug!(category = %category, seq = state.latest, kind = ?kind, "Issuing fetch ticket");
            Some(FetchTicket {
                category,
                seq: state.latest,
                kind,
            })
        });

        CacheGet { entry, fetch }
    }

    /// Force the next `get` to treat `category` as missing.
    ///
    /// An outstanding fetch is not cancelled, but its response will be
    /// discarded once the next ticket is issued.
    pub fn invalidate(&mut self, category: Category) {
        self.entries.pop(&category);
        if let Some(state) = self.seqs.get_mut(&category) {
            state.in_flight = None;
        }
        tracing::debug!(category = %category, "Cache entry invalidated");
    }

    /// Apply the response for `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<MediaItem>, FetchError>,
    ) -> FetchOutcome {
        self.complete_at(ticket, result, Instant::now())
    }

    pub fn complete_at(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<MediaItem>, FetchError>,
        now: Instant,
    ) -> FetchOutcome {
        let state = self.seqs.entry(ticket.category).or_default();
        if ticket.seq != state.latest {
            tracing::debug!(
                category = %ticket.category,
                expected = state.latest,
                got = ticket.seq,
                "Ignoring superseded fetch response (sequence mismatch)"
            );
            return FetchOutcome::Discarded;
        }
        state.in_flight = None;
        let evict_after = self.policy.evict_after;

        match result {
            Ok(items) => {
                let entry = Arc::new(CacheEntry {
                    category: ticket.category,
                    items: Arc::new(items),
                    fetched_at: now,
                });
                if let Some((evicted, _)) = self.entries.push(ticket.category, Arc::clone(&entry)) {
                    if evicted != ticket.category {
                        tracing::debug!(category = %evicted, "Evicted least recently used category");
                    }
                }
                FetchOutcome::Applied(entry)
            }
            Err(error) => match self
                .entries
                .peek(&ticket.category)
                .filter(|e| e.age(now) <= evict_after)
            {
                Some(stale) => FetchOutcome::RefreshFailed {
                    stale: Arc::clone(stale),
                    error,
                },
                None => FetchOutcome::ColdFailed(error),
            },
        }
    }

    /// Drop entries older than `evict_after`.
    fn purge_expired(&mut self, now: Instant) {
        let evict_after = self.policy.evict_after;
        let expired: Vec<Category> = self
            .entries
            .iter()
            .filter(|(_, e)| e.age(now) > evict_after)
            .map(|(c, _)| *c)
            .collect();
        for category in expired {
            self.entries.pop(&category);
            tracing::debug!(category = %category, "Evicted expired cache entry");
        }
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{build_items, FeedKind, FeedRecord};

    fn items(n: usize) -> Vec<MediaItem> {
        let records = (0..n)
            .map(|i| FeedRecord {
                user_id: Some(format!("u{i}")),
                file_url: Some(format!("https://cdn.example.com/{i}.mp4")),
                ..Default::default()
            })
            .collect();
        build_items(records, FeedKind::Reels, Category::News).items
    }

    fn policy() -> CachePolicy {
        CachePolicy {
            stale_after: Duration::from_secs(300),
            evict_after: Duration::from_secs(600),
            max_categories: 4,
        }
    }

    fn seeded(now: Instant) -> CategoryCache {
        let mut cache = CategoryCache::new(policy());
        let ticket = cache.get_at(Category::News, now).fetch.unwrap();
        assert!(matches!(
            cache.complete_at(ticket, Ok(items(3)), now),
            FetchOutcome::Applied(_)
        ));
        cache
    }

    #[test]
    fn test_missing_entry_issues_cold_ticket() {
        let mut cache = CategoryCache::new(policy());
        let got = cache.get_at(Category::News, Instant::now());
        assert!(got.entry.is_none());
        let ticket = got.fetch.unwrap();
        assert_eq!(ticket.kind, FetchKind::Cold);
        assert_eq!(ticket.seq, 1);
    }

    #[test]
    fn test_fresh_entry_served_without_ticket() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let got = cache.get_at(Category::News, t0 + Duration::from_secs(299));
        assert_eq!(got.entry.unwrap().items.len(), 3);
        assert!(got.fetch.is_none());
    }

    #[test]
    fn test_stale_entry_served_with_background_ticket() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let got = cache.get_at(Category::News, t0 + Duration::from_secs(301));
        assert!(got.entry.is_some());
        assert_eq!(got.fetch.unwrap().kind, FetchKind::Background);
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let got = cache.get_at(Category::News, t0 + Duration::from_secs(601));
        assert!(got.entry.is_none());
        assert_eq!(got.fetch.unwrap().kind, FetchKind::Cold);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_no_duplicate_ticket_while_in_flight() {
        let mut cache = CategoryCache::new(policy());
        let now = Instant::now();
        assert!(cache.get_at(Category::News, now).fetch.is_some());
        assert!(cache.get_at(Category::News, now).fetch.is_none());
        // Other categories are independent
        assert!(cache.get_at(Category::Food, now).fetch.is_some());
    }

    #[test]
    fn test_superseded_response_discarded() {
        let mut cache = CategoryCache::new(policy());
        let now = Instant::now();
        let first = cache.get_at(Category::News, now).fetch.unwrap();
        cache.invalidate(Category::News);
        let second = cache.get_at(Category::News, now).fetch.unwrap();
        assert!(second.seq > first.seq);

        // Newer resolves first, older arrives late
        assert!(matches!(
            cache.complete_at(second, Ok(items(2)), now),
            FetchOutcome::Applied(_)
        ));
        assert!(matches!(
            cache.complete_at(first, Ok(items(5)), now),
            FetchOutcome::Discarded
        ));
        let entry = cache.get_at(Category::News, now).entry.unwrap();
        assert_eq!(entry.items.len(), 2);
    }

    #[test]
    fn test_cold_failure_leaves_entry_absent() {
        let mut cache = CategoryCache::new(policy());
        let now = Instant::now();
        let ticket = cache.get_at(Category::News, now).fetch.unwrap();
        let outcome = cache.complete_at(ticket, Err(FetchError::HttpStatus(500)), now);
        assert!(matches!(outcome, FetchOutcome::ColdFailed(_)));

        // Next get retries cold
        let got = cache.get_at(Category::News, now);
        assert!(got.entry.is_none());
        assert_eq!(got.fetch.unwrap().kind, FetchKind::Cold);
    }

    #[test]
    fn test_refresh_failure_keeps_stale_entry() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let later = t0 + Duration::from_secs(400);
        let ticket = cache.get_at(Category::News, later).fetch.unwrap();
        match cache.complete_at(ticket, Err(FetchError::Timeout), later) {
            FetchOutcome::RefreshFailed { stale, .. } => assert_eq!(stale.items.len(), 3),
            other => panic!("Expected RefreshFailed, got {:?}", other),
        }
        assert_eq!(cache.get_at(Category::News, later).entry.unwrap().items.len(), 3);
    }

    #[test]
    fn test_refresh_failure_after_eviction_is_cold() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let ticket = cache.get_at(Category::News, t0 + Duration::from_secs(400)).fetch.unwrap();
        assert_eq!(ticket.kind, FetchKind::Background);

        // Entry expires while the refresh is outstanding
        let late = t0 + Duration::from_secs(700);
        let got = cache.get_at(Category::News, late);
        assert!(got.entry.is_none());
        assert!(got.fetch.is_none());

        let outcome = cache.complete_at(ticket, Err(FetchError::Timeout), late);
        assert!(matches!(outcome, FetchOutcome::ColdFailed(_)));
        assert_eq!(cache.get_at(Category::News, late).fetch.unwrap().kind, FetchKind::Cold);
    }

    #[test]
    fn test_refresh_failure_after_lru_pushout_is_cold() {
        let t0 = Instant::now();
        let mut cache = CategoryCache::new(CachePolicy {
            max_categories: 1,
            ..policy()
        });
        let ticket = cache.get_at(Category::News, t0).fetch.unwrap();
        cache.complete_at(ticket, Ok(items(3)), t0);

        let later = t0 + Duration::from_secs(400);
        let refresh = cache.get_at(Category::News, later).fetch.unwrap();
        let other = cache.get_at(Category::Music, later).fetch.unwrap();
        cache.complete_at(other, Ok(items(1)), later);

        assert!(matches!(
            cache.complete_at(refresh, Err(FetchError::HttpStatus(502)), later),
            FetchOutcome::ColdFailed(_)
        ));
    }

    #[test]
    fn test_refresh_replaces_entry_wholesale() {
        let t0 = Instant::now();
        let mut cache = seeded(t0);
        let later = t0 + Duration::from_secs(400);
        let ticket = cache.get_at(Category::News, later).fetch.unwrap();
        cache.complete_at(ticket, Ok(items(1)), later);
        let got = cache.get_at(Category::News, later);
        assert_eq!(got.entry.unwrap().items.len(), 1);
        assert!(got.fetch.is_none(), "refreshed entry is fresh again");
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let mut cache = CategoryCache::new(policy());
        let now = Instant::now();
        for category in Category::ALL.iter().take(6) {
            let ticket = cache.get_at(*category, now).fetch.unwrap();
            cache.complete_at(ticket, Ok(items(1)), now);
        }
        assert_eq!(cache.len(), 4);
    }
}
