// Connection settings for the remote assistant service.
// Passed explicitly to the client at construction; nothing is read from the
// process environment here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{AssistantError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BETA_HEADER: &str = "assistants=v2";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    /// Base URL of the API (defaults to https://api.openai.com/v1)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `OpenAI-Beta` service-version header
    #[serde(default = "default_beta_header")]
    pub beta_header: String,
    #[serde(default = "default_request_timeout", with = "secs")]
    pub request_timeout: Duration,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_beta_header() -> String {
    DEFAULT_BETA_HEADER.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            beta_header: default_beta_header(),
            request_timeout: default_request_timeout(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_beta_header(mut self, value: impl Into<String>) -> Self {
        self.beta_header = value.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::Validation("API key must not be empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AssistantError::Validation(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("beta_header", &self.beta_header)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
