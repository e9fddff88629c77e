//! Client for the hosted payment provider. This service only creates
//! sessions; payment itself happens on the provider's pages.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub product: &'a str,
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub session_url: String,
}

#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PaymentClient {
    pub fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn sessions_url(&self) -> String {
        format!("{}/sessions", self.base_url)
    }

    pub async fn create_session(
        &self,
        request: &SessionRequest<'_>,
    ) -> Result<SessionResponse, PaymentError> {
        let response = self
            .client
            .post(self.sessions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}
