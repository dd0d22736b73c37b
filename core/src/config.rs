//! Client configuration.
//!
//! The core never reads the environment; hosts build a `ClientConfig` in code
//! or deserialize one from whatever source they own.

use serde::Deserialize;

use crate::types::ApiKey;

pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1/neo";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub api_key: ApiKey,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl ClientConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: default_base_url(),
        }
    }

    /// Configuration using the public `DEMO_KEY` against api.nasa.gov.
    pub fn demo() -> Self {
        Self::new(ApiKey::demo())
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::demo()
    }
}
