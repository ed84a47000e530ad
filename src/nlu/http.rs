//! HTTP client for the NLU service

use async_trait::async_trait;
use url::Url;

use super::{ChatRequest, ChatResponse, NluClient, NluError};
use crate::config::NluConfig;
use crate::{Error, Result};

/// Talks to the NLU service over HTTP
pub struct HttpNluClient {
    client: reqwest::Client,
    chat_url: Url,
    status_url: Url,
}

impl HttpNluClient {
    /// Create a client for the service rooted at `config.base_url`
    ///
    /// # Errors
    ///
    /// Returns error if endpoint URLs cannot be built or the HTTP client fails to initialize
    pub fn new(config: &NluConfig) -> Result<Self> {
        let chat_url = config
            .base_url
            .join("chat")
            .map_err(|e| Error::Config(format!("invalid chat endpoint: {e}")))?;
        let status_url = config
            .base_url
            .join("status")
            .map_err(|e| Error::Config(format!("invalid status endpoint: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            chat_url,
            status_url,
        })
    }
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn chat(&self, request: &ChatRequest) -> std::result::Result<String, NluError> {
        tracing::debug!(url = %self.chat_url, input = %request.chat_input, "sending chat request");

        let response = self
            .client
            .post(self.chat_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "NLU request failed");
                NluError::from(e)
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "NLU service error");
            return Err(NluError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "failed to parse NLU response");
            NluError::Decode(e.to_string())
        })?;

        let output = parsed.into_output()?;
        tracing::info!(answer_len = output.len(), "NLU answer received");
        Ok(output)
    }

    async fn status(&self) -> std::result::Result<String, NluError> {
        let response = self.client.get(self.status_url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NluError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
