//! Short-form media feed: per-category listing cache, viewability tracking,
//! grid/full-screen presentation and playback arbitration.
//!
//! [`controller::FeedController`] is the entry point. It owns every component
//! and exposes the operations a front-end drives (`select_category`,
//! `select_item`, `go_back`, `toggle_mute`, viewport updates) plus a watch
//! stream of [`controller::FeedView`] snapshots.

pub mod app;
pub mod author;
pub mod cache;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod feed;
pub mod mode;
pub mod playback;
pub mod ui;
pub mod util;
pub mod viewability;
