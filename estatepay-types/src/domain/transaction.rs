//! Payment transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::grant::GrantTerm;
use super::money::{Currency, Money};
use super::property::PropertyId;
use super::purpose::Purpose;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Status of a payment attempt.
///
/// The only legal transitions are pending → success and pending → failed.
/// A terminal status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provider-reported terminal outcome for a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Failed,
}

impl PaymentOutcome {
    /// The terminal status this outcome resolves to.
    pub fn terminal_status(&self) -> TransactionStatus {
        match self {
            PaymentOutcome::Success => TransactionStatus::Success,
            PaymentOutcome::Failed => TransactionStatus::Failed,
        }
    }
}

/// One payment attempt against a property.
///
/// The amount and commission are always recorded in the base currency;
/// `display_currency` only records what the payer saw on the hosted page.
/// The grant term is captured at initialization so reconciliation never has
/// to trust duration values echoed back by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Globally unique provider-facing reference.
    pub reference: String,
    pub property_id: PropertyId,
    /// The paying account.
    pub account_id: AccountId,
    pub purpose: Purpose,
    /// Charged amount in the base currency.
    pub amount: Money,
    /// Currency the payer was quoted in.
    pub display_currency: Currency,
    /// Platform commission in kobo.
    pub commission: i64,
    pub status: TransactionStatus,
    pub term: GrantTerm,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns true once the transaction has reached success or failed.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Reconstructs a transaction from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransactionId,
        reference: String,
        property_id: PropertyId,
        account_id: AccountId,
        purpose: Purpose,
        amount: Money,
        display_currency: Currency,
        commission: i64,
        status: TransactionStatus,
        term: GrantTerm,
        start_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reference,
            property_id,
            account_id,
            purpose,
            amount,
            display_currency,
            commission,
            status,
            term,
            start_date,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_not_terminal() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_outcome_resolves_to_terminal_status() {
        assert_eq!(
            PaymentOutcome::Success.terminal_status(),
            TransactionStatus::Success
        );
        assert_eq!(
            PaymentOutcome::Failed.terminal_status(),
            TransactionStatus::Failed
        );
        assert!(PaymentOutcome::Success.terminal_status().is_terminal());
    }
}
