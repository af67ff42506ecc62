use thiserror::Error;
use url::Url;

/// Errors that can occur when validating a link before handing it to the
/// system opener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a link before it is passed to `open::that()`.
///
/// Only `http` and `https` URLs with a host are accepted. Anything else
/// (`file://`, `javascript:`, custom app schemes) could make the platform
/// opener run something other than a browser.
///
/// Private and loopback hosts are allowed: documents are commonly served by
/// the same LAN host as the feed.
///
/// # Examples
///
/// ```
/// use reelfeed::util::validate_url_for_open;
///
/// assert!(validate_url_for_open("https://docs.example.com/a.pdf").is_ok());
/// assert!(validate_url_for_open("file:///etc/passwd").is_err());
/// ```
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}
