//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads environment variables while rendering or reordering. The
//! binaries read the environment and hand the raw values to the helpers below.

use crate::constants::DEFAULT_REST_ADDR;
use crate::validation::validate_api_base_url;
use crate::LmsResult;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreConfig {
    api_base_url: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `api_base_url` is optional. Without it, root-relative image URLs are emitted unchanged.
    ///
    /// # Errors
    ///
    /// Returns `LmsError::InvalidBaseUrl` if a base URL is given but is not a valid
    /// `http(s)` origin.
    pub fn new(api_base_url: Option<String>) -> LmsResult<Self> {
        let api_base_url = api_base_url
            .map(|url| validate_api_base_url(&url))
            .transpose()?;

        Ok(Self { api_base_url })
    }

    /// The normalised API origin (never ends with `/`), if one was configured.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }
}

/// Build a `CoreConfig` from an optional environment value.
///
/// `None` or an empty/whitespace value means "no base URL configured".
pub fn core_config_from_env_value(api_base_url: Option<String>) -> LmsResult<CoreConfig> {
    let value = api_base_url
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    CoreConfig::new(value)
}

/// Resolve the REST listen address from an optional environment value.
pub fn rest_addr_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into())
}
