//! Pipeline orchestration
//!
//! This module ties the stages together: collected batches are normalized
//! into telemetry records, encoded into messages and delivered one message
//! per outbound call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::delivery::{ClientOptions, DeliveryClient, StopToken};
use crate::encoder::{JsonEncoder, RecordEncoder};
use crate::error::{BridgeError, DeliveryFailures, MessageFailure};
use crate::normalizer::Normalizer;
use crate::types::{CollectBatch, TelemetryRecord};

/// Produces the batches of one send
pub trait CollectionGenerator: Send + Sync {
    fn generate(&self) -> Vec<CollectBatch>;
}

impl<F> CollectionGenerator for F
where
    F: Fn() -> Vec<CollectBatch> + Send + Sync,
{
    fn generate(&self) -> Vec<CollectBatch> {
        self()
    }
}

/// Fixed batches, handed out on every send
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    batches: Vec<CollectBatch>,
}

impl StaticGenerator {
    pub fn new(batches: Vec<CollectBatch>) -> Self {
        Self { batches }
    }
}

impl CollectionGenerator for StaticGenerator {
    fn generate(&self) -> Vec<CollectBatch> {
        self.batches.clone()
    }
}

/// What a send does when a message cannot be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Attempt every message, then report all failures together
    #[default]
    Resilient,
    /// Stop at the first failed message; retries are disabled
    FailFast,
}

/// Normalize, encode and deliver collected telemetry.
///
/// Use this when the same target receives repeated sends; the HTTP
/// connection pool is shared between sends.
pub struct CollectPipeline {
    normalizer: Normalizer,
    generator: Option<Arc<dyn CollectionGenerator>>,
    encoder: Arc<dyn RecordEncoder>,
    policy: ErrorPolicy,
    options: ClientOptions,
    http: reqwest::Client,
    stop: StopToken,
}

impl CollectPipeline {
    pub fn new(normalizer: Normalizer, options: ClientOptions) -> Self {
        Self {
            normalizer,
            generator: None,
            encoder: Arc::new(JsonEncoder::new()),
            policy: ErrorPolicy::default(),
            options,
            http: reqwest::Client::new(),
            stop: StopToken::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn CollectionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn RecordEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Token shared by every delivery client of this pipeline
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Generate and normalize batches without sending anything
    pub fn records(&self) -> Result<Vec<TelemetryRecord>, BridgeError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(BridgeError::MissingCollectionGenerator)?;
        Ok(generator
            .generate()
            .iter()
            .filter_map(|batch| self.normalizer.normalize(batch))
            .collect())
    }

    /// Run one full send.
    ///
    /// Encoding failures abort before any message goes out. Delivery
    /// failures follow the configured [`ErrorPolicy`].
    pub async fn send(&self) -> Result<(), BridgeError> {
        let records = self.records()?;
        let messages = self.encoder.encode(&records)?;
        debug!(records = records.len(), messages = messages.len(), "sending messages");
        self.deliver(&messages).await
    }

    /// Deliver already encoded messages
    pub async fn deliver(&self, messages: &[String]) -> Result<(), BridgeError> {
        let mut options = self.options.clone();
        if self.policy == ErrorPolicy::FailFast {
            options.max_retries = 0;
        }

        let mut failures = DeliveryFailures::default();
        for (index, message) in messages.iter().enumerate() {
            let mut client = DeliveryClient::with_http_client(options.clone(), self.http.clone())
                .with_stop_token(self.stop.clone());
            debug!(index, request_id = client.request_id(), "delivering message");

            let Err(source) = client.execute(message).await else {
                continue;
            };
            let failure = MessageFailure {
                index,
                request_id: client.request_id().to_string(),
                method: options.method.as_str().to_string(),
                url: options.url.clone(),
                source,
            };
            error!(error = %failure, "message not delivered");

            match self.policy {
                ErrorPolicy::FailFast => return Err(BridgeError::MessageFailed(failure)),
                ErrorPolicy::Resilient => failures.failures.push(failure),
            }
        }

        if failures.is_empty() {
            info!(messages = messages.len(), "all messages delivered");
            Ok(())
        } else {
            Err(BridgeError::DeliveryFailures(failures))
        }
    }
}
