//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod gateway;
mod ledger;

pub use gateway::{
    GatewayError, PaymentGateway, PaymentSession, ProviderStatus, ProviderVerification,
    SessionRequest,
};
pub use ledger::{NewPayment, PaymentLedger, Reconciliation};
