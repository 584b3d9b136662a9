//! Input validation utilities.
//!
//! Values that come from the environment or from callers are checked here before they are
//! embedded into rendered markup.

use crate::{LmsError, LmsResult};

/// Validates an API base origin and returns it in normalised form.
///
/// The base is prefixed onto root-relative image paths, so it ends up inside a `src`
/// attribute. The guardrails are:
/// - scheme must be `http` or `https`
/// - host must be non-empty
/// - no whitespace, control characters, quotes or angle brackets
/// - no query string or fragment
/// - a trailing `/` is removed so that `base + "/img.png"` never produces `//`
///
/// # Errors
///
/// Returns `LmsError::InvalidBaseUrl` if the value fails any of the checks above.
pub fn validate_api_base_url(value: &str) -> LmsResult<String> {
    const MAX_BASE_URL_LEN: usize = 2048;

    let value = value.trim();
    if value.is_empty() {
        return Err(LmsError::InvalidBaseUrl("base URL cannot be empty".into()));
    }

    if value.len() > MAX_BASE_URL_LEN {
        return Err(LmsError::InvalidBaseUrl(format!(
            "base URL exceeds maximum length of {} characters",
            MAX_BASE_URL_LEN
        )));
    }

    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '`'))
    {
        return Err(LmsError::InvalidBaseUrl(
            "base URL contains characters that are not allowed".into(),
        ));
    }

    let rest = match value.split_once("://") {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") =>
        {
            rest
        }
        _ => {
            return Err(LmsError::InvalidBaseUrl(
                "base URL must start with http:// or https://".into(),
            ))
        }
    };

    if value.contains('?') || value.contains('#') {
        return Err(LmsError::InvalidBaseUrl(
            "base URL must not contain a query string or fragment".into(),
        ));
    }

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(LmsError::InvalidBaseUrl("base URL has no host".into()));
    }

    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_https_origin() {
        assert_eq!(
            validate_api_base_url("https://cdn.example.com").unwrap(),
            "https://cdn.example.com"
        );
    }

    #[test]
    fn test_trims_trailing_slashes_and_whitespace() {
        assert_eq!(
            validate_api_base_url("  http://localhost:8000/api//  ").unwrap(),
            "http://localhost:8000/api"
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(validate_api_base_url("javascript:alert(1)").is_err());
        assert!(validate_api_base_url("ftp://files.example.com").is_err());
        assert!(validate_api_base_url("cdn.example.com").is_err());
    }

    #[test]
    fn test_rejects_query_fragment_and_quotes() {
        assert!(validate_api_base_url("https://cdn.example.com?x=1").is_err());
        assert!(validate_api_base_url("https://cdn.example.com#top").is_err());
        assert!(validate_api_base_url("https://cdn.example.com\"onerror=").is_err());
    }

    #[test]
    fn test_rejects_empty_host() {
        assert!(validate_api_base_url("https://").is_err());
        assert!(validate_api_base_url("https:///path").is_err());
        assert!(validate_api_base_url("").is_err());
    }
}
