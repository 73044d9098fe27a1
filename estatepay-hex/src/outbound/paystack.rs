//! Paystack outbound gateway adapter.
//!
//! Thin reqwest client over Paystack's transaction API. Every call carries a
//! bounded timeout; a timeout or transport failure surfaces as
//! `GatewayError::Unreachable` and the caller's unit of work rolls back,
//! leaving the transaction safely pending.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use estatepay_types::ports::{
    GatewayError, PaymentGateway, PaymentSession, ProviderStatus, ProviderVerification,
    SessionRequest,
};

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Paystack API client implementing the `PaymentGateway` port.
pub struct PaystackGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Paystack's standard response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    authorization_url: String,
    access_code: String,
}

impl PaystackGateway {
    /// Creates a gateway against the live Paystack API.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    /// Creates a gateway against a custom base URL (stubs, test servers).
    pub fn with_base_url(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Unwraps the provider envelope, treating a false status as a refusal.
    async fn read_envelope(&self, response: reqwest::Response) -> Result<Envelope, GatewayError> {
        let http_status = response.status();

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        if !http_status.is_success() || !envelope.status {
            let message = if envelope.message.is_empty() {
                format!("HTTP {}", http_status)
            } else {
                envelope.message
            };
            return Err(GatewayError::Rejected(message));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_session(
        &self,
        request: SessionRequest,
    ) -> Result<PaymentSession, GatewayError> {
        let payload = serde_json::json!({
            "email": request.email,
            "amount": request.amount,
            "currency": request.currency.to_string(),
            "reference": request.reference,
            "metadata": request.metadata,
            "callback_url": request.callback_url,
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let envelope = self.read_envelope(response).await?;

        let session: SessionData = serde_json::from_value(envelope.data)
            .map_err(|e| GatewayError::Rejected(format!("Malformed provider response: {}", e)))?;

        Ok(PaymentSession {
            authorization_url: session.authorization_url,
            access_code: session.access_code,
        })
    }

    async fn verify_by_reference(
        &self,
        reference: &str,
    ) -> Result<ProviderVerification, GatewayError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let envelope = self.read_envelope(response).await?;

        let status = match envelope.data["status"].as_str().unwrap_or_default() {
            "success" => ProviderStatus::Success,
            // Still in flight on the provider side; not a terminal outcome.
            "pending" | "ongoing" | "processing" | "queued" => ProviderStatus::Pending,
            _ => ProviderStatus::Failed,
        };

        Ok(ProviderVerification {
            status,
            raw: envelope.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let gateway = PaystackGateway::new("sk_test_key");
        assert_eq!(gateway.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_envelope_parses_without_data() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"status": false, "message": "Invalid key"}"#).unwrap();
        assert!(!envelope.status);
        assert_eq!(envelope.message, "Invalid key");
        assert!(envelope.data.is_null());
    }
}
