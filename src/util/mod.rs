//! Utility functions for common operations.
//!
//! - **URL validation**: scheme checks before handing links to the system opener
//! - **Text processing**: Unicode-aware width calculation, truncation and
//!   control-character stripping for user-supplied text

mod text;
mod url_validator;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};
