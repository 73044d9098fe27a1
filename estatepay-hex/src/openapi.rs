//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use estatepay_types::domain::{AccountId, Currency, PropertyId, Purpose, TransactionId, TransactionStatus};
use estatepay_types::dto::{
    GrantDetails, InitializePaymentRequest, InitializePaymentResponse, Pagination,
    PaymentHistoryResponse, RatesResponse, SupportedCurrency, TransactionView,
    VerifyPaymentResponse,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Initialize a payment against a property
#[utoipa::path(
    post,
    path = "/api/payments/initialize",
    tag = "payments",
    request_body = InitializePaymentRequest,
    responses(
        (status = 201, description = "Payment session created", body = InitializePaymentResponse),
        (status = 400, description = "Invalid purpose, currency, duration or amount"),
        (status = 404, description = "Property or account not found"),
        (status = 409, description = "Property already has a successful payment"),
        (status = 502, description = "Payment provider unavailable")
    )
)]
async fn initialize_payment() {}

/// Verify a payment by reference
#[utoipa::path(
    get,
    path = "/api/payments/verify/{reference}",
    tag = "payments",
    params(
        ("reference" = String, Path, description = "Provider-facing payment reference")
    ),
    responses(
        (status = 200, description = "Current payment status, including already-settled payments", body = VerifyPaymentResponse),
        (status = 404, description = "Unknown reference"),
        (status = 502, description = "Payment provider unavailable")
    )
)]
async fn verify_payment() {}

/// Receive a signed provider webhook
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    tag = "payments",
    responses(
        (status = 200, description = "Event accepted (processed, replayed or ignored)"),
        (status = 400, description = "Missing or invalid signature"),
        (status = 404, description = "Unknown reference")
    )
)]
async fn webhook() {}

/// List a payer's transactions
#[utoipa::path(
    get,
    path = "/api/payments/history",
    tag = "payments",
    params(
        ("account_id" = AccountId, Query, description = "Paying account ID (UUID)"),
        ("page" = Option<u32>, Query, description = "Page number, defaults to 1"),
        ("limit" = Option<u32>, Query, description = "Page size, defaults to 10")
    ),
    responses(
        (status = 200, description = "Paginated payment history", body = PaymentHistoryResponse),
        (status = 404, description = "Account not found")
    )
)]
async fn payment_history() {}

/// List supported display currencies
#[utoipa::path(
    get,
    path = "/api/payments/currencies",
    tag = "rates",
    responses(
        (status = 200, description = "Supported currencies", body = Vec<SupportedCurrency>)
    )
)]
async fn currencies() {}

/// Current exchange-rate snapshot
#[utoipa::path(
    get,
    path = "/api/payments/rates",
    tag = "rates",
    responses(
        (status = 200, description = "Current snapshot", body = RatesResponse),
        (status = 500, description = "No snapshot available")
    )
)]
async fn rates() {}

/// OpenAPI documentation for the estate payments API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Estate Payments API",
        version = "1.0.0",
        description = "Payment transaction lifecycle for a real-estate marketplace: hosted payment initialization, provider verification, webhook reconciliation and the property access grants successful payments produce.",
    ),
    paths(
        health,
        initialize_payment,
        verify_payment,
        webhook,
        payment_history,
        currencies,
        rates,
    ),
    components(
        schemas(
            InitializePaymentRequest,
            InitializePaymentResponse,
            VerifyPaymentResponse,
            GrantDetails,
            PaymentHistoryResponse,
            TransactionView,
            Pagination,
            RatesResponse,
            SupportedCurrency,
            Currency,
            Purpose,
            TransactionStatus,
            AccountId,
            PropertyId,
            TransactionId,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payments", description = "Payment initialization, verification and webhooks"),
        (name = "rates", description = "Display currencies and exchange rates"),
    )
)]
pub struct ApiDoc;
