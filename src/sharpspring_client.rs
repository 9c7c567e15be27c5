use crate::config::Config;
use crate::errors::{AppError, LeadError};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// HTTP transport for the SharpSpring public API.
#[derive(Clone)]
pub struct SharpSpringClient {
    client: reqwest::Client,
    api_url: String,
}

impl SharpSpringClient {
    /// Creates a new `SharpSpringClient`.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the SharpSpring API, without query string.
    /// * `timeout` - Upper bound for a single outbound call.
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create SharpSpring client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.sharpspring_api_url.clone(),
            Duration::from_secs(config.sharpspring_timeout_secs),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// POSTs a serialized JSON body and decodes the JSON response.
    ///
    /// The decoded value is returned as-is whatever the HTTP status, so
    /// SharpSpring's own error envelopes reach the caller unchanged. Only a
    /// failed exchange or a body that is not JSON is reported as an error.
    pub async fn post_json(&self, url: &Url, body: String) -> Result<Value, LeadError> {
        tracing::info!("Calling SharpSpring API: {}", url.path());

        let content_length = body.len();
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, content_length)
            .body(body)
            .send()
            .await
            .map_err(|e| LeadError::TransportFailure {
                message: format!("SharpSpring request failed: {}", e.without_url()),
                status: None,
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LeadError::TransportFailure {
                message: format!(
                    "Failed to read SharpSpring response: {}",
                    e.without_url()
                ),
                status: Some(status.as_u16()),
            })?;

        let data: Value = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(
                "SharpSpring returned a non-JSON body ({} bytes, status {})",
                bytes.len(),
                status
            );
            LeadError::TransportFailure {
                message: format!("Failed to parse SharpSpring response: {}", e),
                status: Some(status.as_u16()),
            }
        })?;

        if !status.is_success() {
            tracing::warn!("SharpSpring returned status {}", status);
        }
        if let Some(error) = remote_error(&data) {
            tracing::warn!("SharpSpring reported an error: {}", error);
        } else {
            tracing::info!("✓ SharpSpring call completed ({})", status);
        }

        Ok(data)
    }
}

/// The `error` member of a SharpSpring response envelope, when it carries one.
pub fn remote_error(response: &Value) -> Option<&Value> {
    match response.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(error) => Some(error),
    }
}
