//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use estatepay_types::{
    AccountId, AppError, InitializePaymentRequest, PaymentGateway, PaymentLedger,
    WebhookDisposition,
};

use crate::PaymentService;

/// Header the provider ships webhook signatures in.
const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Application state shared across handlers.
pub struct AppState<L: PaymentLedger, G: PaymentGateway> {
    pub service: PaymentService<L, G>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Validation detail goes back to the caller; provider and internal
        // failures stay generic and land in the logs instead.
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::DuplicatePayment => (StatusCode::CONFLICT, self.0.to_string()),
            AppError::InvalidSignature => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::Provider(msg) => {
                tracing::error!(error = %msg, "payment provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Payment provider unavailable".to_string(),
                )
            }
            AppError::RatesUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Initialize a payment against a property.
#[tracing::instrument(skip(state, req), fields(property_id = %req.property_id, purpose = %req.purpose))]
pub async fn initialize_payment<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Json(req): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.initialize_payment(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Verify a payment by its reference.
#[tracing::instrument(skip(state), fields(reference = %reference))]
pub async fn verify_payment<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if reference.trim().is_empty() {
        return Err(AppError::BadRequest("Reference is required".into()).into());
    }

    let response = state.service.verify_payment(&reference).await?;
    Ok(Json(response))
}

/// Receive a signed provider webhook.
///
/// The body is taken raw so the signature is checked over the exact bytes
/// the provider sent. Responses never carry internal error detail.
#[tracing::instrument(skip_all)]
pub async fn webhook<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let disposition = state.service.process_webhook(&body, signature).await?;

    let message = match disposition {
        WebhookDisposition::Processed => "Webhook processed successfully",
        WebhookDisposition::AlreadyProcessed => "Webhook already processed",
        WebhookDisposition::Ignored => "Webhook event ignored",
    };

    Ok(Json(serde_json::json!({ "message": message })))
}

/// Query parameters for the payment history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub account_id: AccountId,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// List a payer's transactions.
#[tracing::instrument(skip(state), fields(account_id = %params.account_id))]
pub async fn payment_history<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .service
        .payment_history(params.account_id, params.page, params.limit)
        .await?;
    Ok(Json(response))
}

/// List the supported display currencies.
pub async fn currencies<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
) -> impl IntoResponse {
    Json(state.service.supported_currencies())
}

/// Current exchange-rate snapshot.
#[tracing::instrument(skip(state))]
pub async fn rates<L: PaymentLedger, G: PaymentGateway>(
    State(state): State<Arc<AppState<L, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.currency_rates().await?;
    Ok(Json(response))
}
