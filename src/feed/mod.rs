//! Feed data model and the remote source it is fetched from.
//!
//! - [`types`] - Categories, item identity and the immutable [`MediaItem`]
//! - [`source`] - The [`RemoteApi`] collaborator and its HTTP implementation
//!
//! # Example
//!
//! ```ignore
//! use reelfeed::feed::{Category, FeedKind, HttpApi, RemoteApi};
//!
//! let api = HttpApi::new(client, "http://localhost:4000", timeout)?;
//! let items = api.fetch_feed(FeedKind::Reels, Category::News).await?;
//! ```

mod source;
mod types;

pub use source::{FetchError, HttpApi, RemoteApi};
pub use types::{
    build_items, AuthorId, BuildResult, Category, FeedKind, FeedRecord, ItemId, MediaItem,
    MediaKind, ProfileRecord, UnknownCategory,
};
