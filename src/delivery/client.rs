//! Retrying HTTP client for one outbound call

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ClientOptions, StopToken};
use crate::error::DeliveryError;

/// Executes one logical request with bounded retries.
///
/// The client records the status and body of its last attempt, so an instance
/// serves a single caller; build a fresh one per outbound call.
pub struct DeliveryClient {
    options: ClientOptions,
    http: reqwest::Client,
    request_id: String,
    stop: StopToken,
    status_code: Option<u16>,
    bytes: Vec<u8>,
    attempts: u32,
}

impl DeliveryClient {
    pub fn new(options: ClientOptions) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(options, http))
    }

    /// Reuse an existing connection pool
    pub fn with_http_client(options: ClientOptions, http: reqwest::Client) -> Self {
        let request_id = options
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            options,
            http,
            request_id,
            stop: StopToken::new(),
            status_code: None,
            bytes: Vec::new(),
            attempts: 0,
        }
    }

    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Prevent any further attempt of this call
    pub fn stop_retries(&self) {
        self.stop.stop();
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Status of the last answered attempt
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Raw body of the last answered attempt
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Send `payload`, retrying failed attempts up to `max_retries` times.
    ///
    /// Returns the response body as text, or an empty string in byte-only
    /// mode. A stop before an attempt ends the loop without a network call.
    /// Invalid configured headers fail before the first attempt.
    pub async fn execute(&mut self, payload: &str) -> Result<String, DeliveryError> {
        let method = self.options.method.as_str();
        let max_retries = self.options.max_retries;
        let headers = self.headers()?;
        let mut retry_count: u32 = 0;

        loop {
            if self.stop.is_stopped() {
                return Err(DeliveryError::Stopped {
                    method: method.to_string(),
                    request_id: self.request_id.clone(),
                    url: self.options.url.clone(),
                });
            }

            self.attempts += 1;
            match self.attempt(&headers, payload).await {
                Ok(body) => {
                    if retry_count != 0 {
                        info!(
                            request_id = %self.request_id,
                            method,
                            url = %self.options.url,
                            retry = retry_count,
                            max_retries,
                            "re-call with success"
                        );
                    }
                    return Ok(body);
                }
                Err(err) => {
                    warn!(
                        request_id = %self.request_id,
                        method,
                        url = %self.options.url,
                        retry = retry_count,
                        max_retries,
                        error = %err,
                        "error asking"
                    );
                    if retry_count >= max_retries {
                        error!(
                            request_id = %self.request_id,
                            method,
                            url = %self.options.url,
                            max_retries,
                            error = %err,
                            "retries exceeded"
                        );
                        return Err(err);
                    }

                    let stop = self.stop.clone();
                    tokio::select! {
                        _ = tokio::time::sleep(self.options.retry_delay()) => {}
                        _ = stop.stopped() => {
                            debug!(request_id = %self.request_id, "retry wait interrupted");
                        }
                    }
                    retry_count += 1;
                }
            }
        }
    }

    async fn attempt(
        &mut self,
        headers: &HeaderMap,
        payload: &str,
    ) -> Result<String, DeliveryError> {
        debug!(
            request_id = %self.request_id,
            method = self.options.method.as_str(),
            url = %self.options.url,
            "url to ask"
        );

        let response = self
            .http
            .request(self.options.method.to_reqwest(), &self.options.url)
            .headers(headers.clone())
            .timeout(self.options.timeout())
            .body(payload.to_string())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.status_code = e.status().map(|s| s.as_u16());
                self.bytes.clear();
                return Err(DeliveryError::Transport(e));
            }
        };

        let status = response.status();
        self.status_code = Some(status.as_u16());

        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                error!(request_id = %self.request_id, error = %e, "error reading response body");
                Vec::new()
            }
        };
        self.bytes = body;

        if !status.is_success() {
            return Err(DeliveryError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&self.bytes).into_owned(),
            });
        }
        if self.options.only_bytes {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&self.bytes).into_owned())
    }

    fn headers(&self) -> Result<HeaderMap, DeliveryError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DeliveryError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| DeliveryError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = self.options.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(api_key)
                .map_err(|_| DeliveryError::InvalidHeader("X-ApiKey".to_string()))?;
            headers.insert("X-ApiKey", value);
        }
        if let Some(api_pass) = self.options.api_pass.as_deref().filter(|p| !p.is_empty()) {
            let value = HeaderValue::from_str(api_pass)
                .map_err(|_| DeliveryError::InvalidHeader("X-ApiPass".to_string()))?;
            headers.insert("X-ApiPass", value);
        }
        Ok(headers)
    }
}
