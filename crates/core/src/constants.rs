//! Constants used throughout the LMS core crate.
//!
//! Markup fragments and environment variable names live here so the renderer, the
//! binaries and the tests agree on them.

/// Environment variable holding the API origin used to resolve root-relative image URLs.
pub const API_BASE_URL_ENV: &str = "LMS_API_BASE_URL";

/// Environment variable holding the REST listen address.
pub const REST_ADDR_ENV: &str = "LMS_REST_ADDR";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Markup emitted when a lesson has no content, or a document has zero blocks.
pub const NO_CONTENT_PLACEHOLDER: &str = r#"<p class="lesson-empty">No content available</p>"#;

/// Permissions granted to embedded frames.
pub const EMBED_ALLOW_POLICY: &str =
    "autoplay; fullscreen; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Header level used when the editor omits one.
pub const DEFAULT_HEADER_LEVEL: u8 = 2;

/// Valid header levels, inclusive.
pub const MIN_HEADER_LEVEL: u8 = 1;
pub const MAX_HEADER_LEVEL: u8 = 6;

/// Nesting depth after which nested list items are flattened into their parent.
pub const MAX_LIST_DEPTH: usize = 8;
