use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::util::strip_control_chars;

// ============================================================================
// Category
// ============================================================================

/// Error returned when a category name is not one of the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

/// Feed category. `All` is the unfiltered sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    All,
    Entertainment,
    Education,
    Technology,
    Travel,
    Food,
    Fitness,
    Music,
    Comedy,
    Motivation,
    Fashion,
    News,
    Happy,
    Sad,
    Angry,
}

impl Category {
    /// All categories in display order (the order of the category strip).
    pub const ALL: [Category; 15] = [
        Category::All,
        Category::Entertainment,
        Category::Education,
        Category::Technology,
        Category::Travel,
        Category::Food,
        Category::Fitness,
        Category::Music,
        Category::Comedy,
        Category::Motivation,
        Category::Fashion,
        Category::News,
        Category::Happy,
        Category::Sad,
        Category::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::Technology => "Technology",
            Category::Travel => "Travel",
            Category::Food => "Food",
            Category::Fitness => "Fitness",
            Category::Music => "Music",
            Category::Comedy => "Comedy",
            Category::Motivation => "Motivation",
            Category::Fashion => "Fashion",
            Category::News => "News",
            Category::Happy => "Happy",
            Category::Sad => "Sad",
            Category::Angry => "Angry",
        }
    }

    /// Position in [`Category::ALL`].
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    /// Next category in the strip, wrapping around.
    pub fn next(&self) -> Category {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Previous category in the strip, wrapping around.
    pub fn prev(&self) -> Category {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

// ============================================================================
// Feed and Media Kinds
// ============================================================================

/// Which remote feed the controller browses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Short videos, served from `/reels`.
    Reels,
    /// Still images, served from `/memes`.
    Memes,
}

impl FeedKind {
    /// Path segment of the listing endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            FeedKind::Reels => "reels",
            FeedKind::Memes => "memes",
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            FeedKind::Reels => MediaKind::Video,
            FeedKind::Memes => MediaKind::Image,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reels" | "reel" | "video" => Ok(FeedKind::Reels),
            "memes" | "meme" | "image" => Ok(FeedKind::Memes),
            other => Err(format!("Unknown feed kind: {other} (expected reels or memes)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Image,
}

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identity of a feed item within a session.
///
/// Per-item playback and mute state is keyed by this, never by list position,
/// so a reordered or refreshed list keeps state attached to the right item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Content-derived id for records the backend sent without one.
    fn derive(author_id: &str, media_url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(author_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(media_url.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        Self(Arc::from(hex))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorId(Arc<str>);

impl AuthorId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Media Item
// ============================================================================

/// One entry of a feed. Immutable once built from a [`FeedRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: ItemId,
    pub author_id: AuthorId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub description: String,
    pub document_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: Category,
    pub timestamp: Option<DateTime<Utc>>,
}

impl MediaItem {
    pub fn has_document(&self) -> bool {
        self.document_url.is_some()
    }
}

/// Wire shape of a listing entry.
///
/// Every field except `fileUrl` is optional on the wire; records missing it
/// are dropped by [`build_items`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doc_file_url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Wire shape of a profile lookup. Any field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

/// Result of converting a raw listing into items.
#[derive(Debug, Default)]
pub struct BuildResult {
    pub items: Vec<MediaItem>,
    /// Records dropped because they had no media URL.
    pub skipped: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert wire records into items, preserving order.
///
/// Ids come from the record when present. Otherwise they are derived from the
/// author and media URL; a repeated pair gets an occurrence suffix so ids stay
/// unique within the list.
pub fn build_items(records: Vec<FeedRecord>, kind: FeedKind, category: Category) -> BuildResult {
    let mut items = Vec::with_capacity(records.len());
    let mut skipped = 0;
    let mut emitted: HashSet<ItemId> = HashSet::new();
    let mut next_suffix: HashMap<ItemId, usize> = HashMap::new();

    for record in records {
        let Some(media_url) = non_empty(record.file_url) else {
            skipped += 1;
            continue;
        };
        let author = non_empty(record.user_id).unwrap_or_default();

        let base_id = match non_empty(record.id) {
            Some(id) => ItemId::new(id),
            None => ItemId::derive(&author, &media_url),
        };
        let id = if emitted.contains(&base_id) {
            // A suffixed id may collide with a literal id from the backend
            let suffix = next_suffix.entry(base_id.clone()).or_insert(1);
            loop {
                *suffix += 1;
                let candidate = ItemId::new(format!("{}#{}", base_id, suffix));
                if !emitted.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base_id
        };
        emitted.insert(id.clone());

        let timestamp = record
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        let description = record
            .description
            .as_deref()
            .map(|d| strip_control_chars(d).into_owned())
            .unwrap_or_default();

        items.push(MediaItem {
            id,
            author_id: AuthorId::new(strip_control_chars(&author).into_owned()),
            media_url,
            media_kind: kind.media_kind(),
            description,
            document_url: non_empty(record.doc_file_url),
            thumbnail_url: non_empty(record.thumbnail_url),
            category,
            timestamp,
        });
    }

    BuildResult { items, skipped }
}
