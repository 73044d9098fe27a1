//! HTTP Outbound Adapters
//!
//! Clients for external collaborators, currently just the payment provider.

mod paystack;

pub use paystack::PaystackGateway;
