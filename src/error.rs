//! Error types for Telemetry Bridge

use std::fmt;

use thiserror::Error;

/// Errors surfaced by the library layers above a single HTTP call
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model name: {0}")]
    InvalidModelName(String),

    #[error("it's necessary to provide a collection generator")]
    MissingCollectionGenerator,

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    MessageFailed(MessageFailure),

    #[error("{0}")]
    DeliveryFailures(DeliveryFailures),
}

/// Errors produced by one logical outbound call, after retries
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("[{method}][{request_id}]:{url} retries stopped")]
    Stopped {
        method: String,
        request_id: String,
        url: String,
    },

    #[error("httpResponse is not success. Code: {code}, and message: {body}")]
    Status { code: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid header {0}")]
    InvalidHeader(String),
}

impl DeliveryError {
    /// HTTP status carried by the error, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { code, .. } => Some(*code),
            DeliveryError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A single outbound message that could not be delivered
#[derive(Debug)]
pub struct MessageFailure {
    /// Zero-based position of the message in the send batch
    pub index: usize,
    pub request_id: String,
    pub method: String,
    pub url: String,
    pub source: DeliveryError,
}

impl fmt::Display for MessageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[err {}]: [{}] error performing: [{}]{}, error: {}",
            self.index, self.request_id, self.method, self.url, self.source
        )
    }
}

/// Every failed message of a resilient send, in send order
#[derive(Debug, Default)]
pub struct DeliveryFailures {
    pub failures: Vec<MessageFailure>,
}

impl DeliveryFailures {
    pub fn indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for DeliveryFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
