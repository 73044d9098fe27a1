//! Payment provider gateway port.
//!
//! An explicit async interface over the hosted-payment provider: no
//! redirects or implicit side effects inside the core, just a session
//! handle out and a verification result back.

use crate::domain::Currency;

/// Error type for gateway operations.
///
/// Both variants leave the local unit of work rolled back and are safe to
/// retry; they are separated so logs can tell a provider refusal from a
/// transport failure.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Provider unreachable: {0}")]
    Unreachable(String),
}

/// Request to open a hosted payment session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Payer email, required by the provider.
    pub email: String,
    /// Amount in minor units of `currency`.
    pub amount: i64,
    pub currency: Currency,
    pub reference: String,
    /// Where the provider sends the payer after the hosted page.
    pub callback_url: String,
    /// Opaque context echoed back on provider events.
    pub metadata: serde_json::Value,
}

/// A hosted payment session the payer is redirected to.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub access_code: String,
}

/// The provider's authoritative view of a payment attempt.
///
/// `Pending` covers every in-flight provider state (pending, ongoing,
/// queued); only `Success` and `Failed` may move the local transaction to a
/// terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Success,
    Failed,
    Pending,
}

/// Verification result with the provider's raw payload for audit logging.
#[derive(Debug, Clone)]
pub struct ProviderVerification {
    pub status: ProviderStatus,
    pub raw: serde_json::Value,
}

/// Port trait for the hosted payment provider.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Opens a hosted payment session for the payer to complete.
    async fn initialize_session(
        &self,
        request: SessionRequest,
    ) -> Result<PaymentSession, GatewayError>;

    /// Queries the provider's authoritative status for a reference.
    async fn verify_by_reference(
        &self,
        reference: &str,
    ) -> Result<ProviderVerification, GatewayError>;
}
