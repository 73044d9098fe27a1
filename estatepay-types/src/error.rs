//! Error types for the estate payments service.

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unsupported payment purpose: {0}")]
    UnsupportedPurpose(String),

    #[error("Invalid currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Inspection fee not set for this property")]
    InspectionFeeNotSet,

    #[error("Total price not set for this property")]
    PriceNotSet,

    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Ledger-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Property already has a successful payment")]
    DuplicatePayment,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A state conflict, distinct from bad input: the property already has a
    /// qualifying successful payment.
    #[error("Property already has a successful payment")]
    DuplicatePayment,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// The payment provider rejected the request or could not be reached.
    /// The local unit of work has been rolled back; safe to retry.
    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Exchange rates not available")]
    RatesUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(e) => AppError::BadRequest(e.to_string()),
            LedgerError::NotFound => AppError::NotFound("Resource not found".into()),
            LedgerError::DuplicatePayment => AppError::DuplicatePayment,
            LedgerError::Database(e) => AppError::Internal(e),
            LedgerError::Transaction(e) => AppError::Internal(e),
            LedgerError::Conflict(e) => AppError::BadRequest(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::ports::GatewayError> for AppError {
    fn from(err: crate::ports::GatewayError) -> Self {
        AppError::Provider(err.to_string())
    }
}
