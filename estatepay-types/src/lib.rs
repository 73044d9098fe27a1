//! # Estatepay Types
//!
//! Domain types and port traits for the estate payments service.
//! This crate has no IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Property, Transaction, PropertyGrant)
//!   and pure payment rules (purpose pricing, commission, grant windows)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Account, AccountId, Currency, GrantTerm, ListingCategory, Money, PaymentOutcome, Property,
    PropertyGrant, PropertyId, Purpose, RateSnapshot, Transaction, TransactionId,
    TransactionStatus, calculate_commission, generate_reference, grant_window, validate_purpose,
};
pub use dto::*;
pub use error::{AppError, DomainError, LedgerError};
pub use ports::{
    GatewayError, NewPayment, PaymentGateway, PaymentLedger, PaymentSession, ProviderStatus,
    ProviderVerification, Reconciliation, SessionRequest,
};
