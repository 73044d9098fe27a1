//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Currency, PropertyGrant, PropertyId, Purpose, RateSnapshot, Transaction, TransactionId,
    TransactionStatus,
};

// ─────────────────────────────────────────────────────────────────────────────
// Payment initialization
// ─────────────────────────────────────────────────────────────────────────────

/// Request to initialize a payment against a property.
///
/// Identifiers, `purpose` and `currency` arrive as raw strings and are
/// validated in the service so rejects surface as 400s with a reason, not
/// deserialization failures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitializePaymentRequest {
    #[serde(default)]
    #[schema(value_type = String, example = "4f5c1f3e-8b5d-4c6a-9f62-8a2f4f1f0d11")]
    pub property_id: String,
    /// The paying account.
    #[serde(default)]
    #[schema(value_type = String, example = "7a0b8f9c-1d2e-4f30-a1b2-c3d4e5f60718")]
    pub account_id: String,
    /// One of `inspection_fee`, `rent`, `sale`, `shortlet`.
    #[schema(example = "rent")]
    pub purpose: String,
    /// Display currency for the hosted payment page.
    #[serde(default = "default_currency")]
    #[schema(example = "NGN")]
    pub currency: String,
    /// Rental term; ignored for other purposes.
    #[serde(default = "default_duration_months")]
    #[schema(example = 12)]
    pub duration_months: u32,
    /// Shortlet term; ignored for other purposes.
    #[serde(default = "default_duration_days")]
    #[schema(example = 1)]
    pub duration_days: u32,
    /// When the grant window should open; defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    Currency::BASE.to_string()
}

fn default_duration_months() -> u32 {
    12
}

fn default_duration_days() -> u32 {
    1
}

/// Response after initializing a payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitializePaymentResponse {
    /// Hosted payment page the payer is redirected to.
    pub payment_link: String,
    pub reference: String,
    pub access_code: String,
    /// Amount quoted to the payer, in minor units of `currency`.
    #[schema(example = 12_000_000)]
    pub amount: i64,
    pub currency: Currency,
    /// Ledger amount in kobo; always recorded in the base currency.
    pub base_amount: i64,
    pub base_currency: Currency,
    pub duration_months: u32,
    pub duration_days: u32,
    pub start_date: DateTime<Utc>,
    /// Grant window end, absent for inspection fees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

/// Access-grant details attached to a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantDetails {
    pub duration_months: u32,
    pub duration_days: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub expired: bool,
}

impl GrantDetails {
    /// Builds the view of a grant, evaluating expiry lazily against `now`.
    pub fn from_grant(grant: &PropertyGrant, now: DateTime<Utc>) -> Self {
        Self {
            duration_months: grant.duration_months,
            duration_days: grant.duration_days,
            start_date: grant.start_date,
            end_date: grant.end_date,
            expired: grant.is_expired(now),
        }
    }
}

/// Response to a verification poll.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub status: TransactionStatus,
    pub reference: String,
    /// Ledger amount in kobo.
    pub amount: i64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<GrantDetails>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook
// ─────────────────────────────────────────────────────────────────────────────

/// A signed provider event, parsed after signature verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEventData {
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// What processing a webhook event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The event moved a transaction to a terminal state.
    Processed,
    /// A replay of an already-reconciled event; acknowledged, nothing done.
    AlreadyProcessed,
    /// An event type this core does not act on.
    Ignored,
}

// ─────────────────────────────────────────────────────────────────────────────
// History & rates
// ─────────────────────────────────────────────────────────────────────────────

/// One payer transaction in a history listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionView {
    pub id: TransactionId,
    pub reference: String,
    pub property_id: PropertyId,
    pub purpose: Purpose,
    /// Ledger amount in kobo.
    pub amount: i64,
    pub currency: Currency,
    pub display_currency: Currency,
    pub commission: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            reference: tx.reference.clone(),
            property_id: tx.property_id,
            purpose: tx.purpose,
            amount: tx.amount.amount(),
            currency: tx.amount.currency(),
            display_currency: tx.display_currency,
            commission: tx.commission,
            status: tx.status,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

/// Paginated payer history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentHistoryResponse {
    pub transactions: Vec<TransactionView>,
    pub pagination: Pagination,
}

/// Current exchange-rate snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatesResponse {
    pub usd: f64,
    pub eur: f64,
    pub gbp: f64,
    pub last_updated: NaiveDate,
}

impl From<&RateSnapshot> for RatesResponse {
    fn from(snapshot: &RateSnapshot) -> Self {
        Self {
            usd: snapshot.usd,
            eur: snapshot.eur,
            gbp: snapshot.gbp,
            last_updated: snapshot.last_updated,
        }
    }
}

/// A currency the marketplace can quote in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SupportedCurrency {
    pub code: Currency,
    pub name: &'static str,
    pub symbol: &'static str,
}
