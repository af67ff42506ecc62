//! Feed-level error taxonomy.
//!
//! Each variant names a failure the controller can observe. None of them is
//! fatal: a cold fetch failure becomes [`FeedStatus::Failed`], a document link
//! failure becomes a one-shot notice, everything else is logged.
//!
//! [`FeedStatus::Failed`]: crate::controller::FeedStatus::Failed

use thiserror::Error;

use crate::document::DocumentOpenError;
use crate::feed::{AuthorId, Category, FetchError, ItemId};
use crate::playback::MediaInitError;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Cold fetch failed and nothing is cached for the category.
    #[error("Failed to load {category}: {source}")]
    FetchFailed {
        category: Category,
        #[source]
        source: FetchError,
    },

    /// Background refresh failed; the stale listing keeps being served.
    #[error("Refresh of {category} failed: {source}")]
    RefreshFailed {
        category: Category,
        #[source]
        source: FetchError,
    },

    #[error("Profile lookup for {author} failed: {source}")]
    MetadataLookupFailed {
        author: AuthorId,
        #[source]
        source: FetchError,
    },

    /// The item stays attached but does not play.
    #[error("Media for {item} could not be initialized: {source}")]
    MediaInitFailed {
        item: ItemId,
        #[source]
        source: MediaInitError,
    },

    #[error("Could not open document: {0}")]
    DocumentLinkOpenFailed(#[from] DocumentOpenError),
}

impl FeedError {
    /// Whether the failure should be shown to the user rather than only
    /// logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            FeedError::FetchFailed { .. } | FeedError::DocumentLinkOpenFailed(_)
        )
    }
}
