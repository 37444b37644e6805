//! Delivery client options

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-attempt timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Wait between attempts used when none is configured
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// HTTP verb of the outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
    Patch,
}

impl RestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestMethod::Get => "GET",
            RestMethod::Post => "POST",
            RestMethod::Put => "PUT",
            RestMethod::Delete => "DELETE",
            RestMethod::Patch => "PATCH",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            RestMethod::Get => reqwest::Method::GET,
            RestMethod::Post => reqwest::Method::POST,
            RestMethod::Put => reqwest::Method::PUT,
            RestMethod::Delete => reqwest::Method::DELETE,
            RestMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Everything one outbound call target needs.
///
/// Durations are plain milliseconds so the struct reads naturally from TOML;
/// zero selects the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub url: String,
    pub method: RestMethod,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Sent as `X-ApiKey` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sent as `X-ApiPass` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_pass: Option<String>,
    pub timeout_ms: u64,
    /// Attempts after the first one
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Correlation id for logs, generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Keep the raw response bytes and return an empty body
    pub only_bytes: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: RestMethod::default(),
            headers: BTreeMap::new(),
            api_key: None,
            api_pass: None,
            timeout_ms: 0,
            max_retries: 0,
            retry_delay_ms: 0,
            request_id: None,
            only_bytes: false,
        }
    }
}

impl ClientOptions {
    pub fn new(url: impl Into<String>, method: RestMethod) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_pass: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.api_pass = Some(api_pass.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn only_bytes(mut self) -> Self {
        self.only_bytes = true;
        self
    }

    pub fn timeout(&self) -> Duration {
        non_zero_or(self.timeout_ms, DEFAULT_TIMEOUT)
    }

    pub fn retry_delay(&self) -> Duration {
        non_zero_or(self.retry_delay_ms, DEFAULT_RETRY_DELAY)
    }
}

fn non_zero_or(millis: u64, default: Duration) -> Duration {
    if millis == 0 {
        default
    } else {
        Duration::from_millis(millis)
    }
}
