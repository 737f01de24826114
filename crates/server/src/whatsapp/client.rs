//! Fonnte API client.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use jamur_pos_core::whatsapp_target;

use crate::config::FonnteConfig;

use super::error::FonnteError;
use super::types::{DeliveryReport, SendRequest, failure_reason, interpret_body};

/// Fonnte WhatsApp gateway client.
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Clone)]
pub struct FonnteClient {
    inner: Arc<FonnteClientInner>,
}

struct FonnteClientInner {
    client: reqwest::Client,
    url: Url,
    token: Option<SecretString>,
    country_code: String,
}

impl FonnteClient {
    /// Create a new Fonnte client.
    ///
    /// # Errors
    ///
    /// Returns `FonnteError::Http` if the HTTP client cannot be built.
    pub fn new(config: &FonnteConfig) -> Result<Self, FonnteError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(FonnteClientInner {
                client,
                url: config.url.clone(),
                token: config.token.clone(),
                country_code: config.country_code.clone(),
            }),
        })
    }

    /// Whether a device token is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.token.is_some()
    }

    /// Send a text message to `phone`.
    ///
    /// Never fails: every problem is folded into a `FAILED` report whose
    /// message explains what went wrong.
    #[instrument(skip(self, phone, message))]
    pub async fn send_message(&self, phone: &str, message: &str) -> DeliveryReport {
        let target = whatsapp_target(phone, &self.inner.country_code);

        match self.post(&target, message).await {
            Ok(()) => {
                tracing::info!(target = %target, "WhatsApp message sent");
                DeliveryReport::sent()
            }
            Err(FonnteError::MissingToken) => {
                tracing::warn!("Fonnte token not configured");
                DeliveryReport::failed(FonnteError::MissingToken.to_string())
            }
            Err(e) => {
                tracing::error!(target = %target, error = %e, "WhatsApp message failed");
                DeliveryReport::failed(e.to_string())
            }
        }
    }

    async fn post(&self, target: &str, message: &str) -> Result<(), FonnteError> {
        let token = self.inner.token.as_ref().ok_or(FonnteError::MissingToken)?;

        let request = SendRequest {
            target,
            message,
            country_code: &self.inner.country_code,
        };

        let response = self
            .inner
            .client
            .post(self.inner.url.clone())
            .header(AUTHORIZATION, token.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);

        match interpret_body(&body) {
            Ok(()) if status.is_success() => Ok(()),
            Ok(()) => {
                tracing::warn!(
                    status = status.as_u16(),
                    "Fonnte reported success with an error status"
                );
                Err(FonnteError::Rejected(failure_reason(&body)))
            }
            Err(reason) => Err(FonnteError::Rejected(reason)),
        }
    }
}
