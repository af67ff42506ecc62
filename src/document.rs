//! Opening an item's attached document in the system browser.

use thiserror::Error;

use crate::util::{validate_url_for_open, UrlValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentOpenError {
    #[error("Item has no document attached")]
    MissingLink,
    #[error("Refusing to open link: {0}")]
    InvalidLink(#[from] UrlValidationError),
    #[error("System opener failed: {0}")]
    Opener(String),
}

/// Hands a validated link to something that can display it.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &url::Url) -> Result<(), DocumentOpenError>;
}

/// Opens links with the platform handler (`xdg-open`, `open`, `start`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, url: &url::Url) -> Result<(), DocumentOpenError> {
        open::that(url.as_str()).map_err(|e| DocumentOpenError::Opener(e.to_string()))
    }
}

/// Validate `link` and pass it to `opener`.
pub fn open_document(opener: &dyn LinkOpener, link: Option<&str>) -> Result<(), DocumentOpenError> {
    let link = link.ok_or(DocumentOpenError::MissingLink)?;
    let url = validate_url_for_open(link)?;
    tracing::info!(url = %url, "Opening document");
    opener.open(&url)
}
