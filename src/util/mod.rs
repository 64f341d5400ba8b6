//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Text processing**: markup/entity sanitizing for provider summaries,
//!   control-character stripping and width-aware truncation for terminal output
//! - **URL validation**: http(s)-only article URLs and private-host detection
//!
//! # Examples
//!
//! ```
//! use newsreel::util::{sanitize, truncate_to_width, validate_url};
//!
//! assert_eq!(sanitize("<b>Apple</b> &amp; Google"), "Apple & Google");
//! assert!(validate_url("https://example.com/story").is_ok());
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, sanitize, strip_control_chars, truncate_to_width};
pub use url_validator::{is_private_host, validate_url, UrlValidationError};

/// Maximum accepted search keyword length
pub const MAX_KEYWORD_LENGTH: usize = 256;
