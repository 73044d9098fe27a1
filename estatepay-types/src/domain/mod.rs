//! Domain models for the estate payments service.

pub mod account;
pub mod grant;
pub mod money;
pub mod pricing;
pub mod property;
pub mod purpose;
pub mod rates;
pub mod transaction;

pub use account::{Account, AccountId, Role};
pub use grant::{GrantTerm, PropertyGrant, grant_window};
pub use money::{Currency, Money};
pub use pricing::{calculate_commission, generate_reference};
pub use property::{ListingCategory, Property, PropertyId};
pub use purpose::{AmountField, DurationUnit, PricingRule, Purpose, validate_purpose};
pub use rates::RateSnapshot;
pub use transaction::{PaymentOutcome, Transaction, TransactionId, TransactionStatus};
