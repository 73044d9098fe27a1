//! Payment ledger port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! The relational adapter (Postgres) implements this trait.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    Account, AccountId, Currency, GrantTerm, PaymentOutcome, Property, PropertyGrant, PropertyId,
    Purpose, RateSnapshot, Transaction, TransactionId,
};
use crate::error::LedgerError;

/// Fields needed to record a new pending payment attempt.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub property_id: PropertyId,
    pub account_id: AccountId,
    pub purpose: Purpose,
    pub reference: String,
    /// Charged amount in kobo (base currency).
    pub amount: i64,
    pub display_currency: Currency,
    /// Commission in kobo.
    pub commission: i64,
    pub term: GrantTerm,
    pub start_date: DateTime<Utc>,
}

/// Result of applying a provider outcome to a transaction.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub transaction: Transaction,
    pub grant: Option<PropertyGrant>,
    /// False when the transaction was already terminal and the call
    /// short-circuited without touching any state.
    pub newly_applied: bool,
}

/// The authoritative store of payment attempts and the access grants they
/// produce.
///
/// Every mutating operation MUST run as one atomic database transaction:
/// either all of its writes commit or none do. `apply_outcome` additionally
/// serializes concurrent calls on the same reference with a row-level lock,
/// so exactly one caller performs the side effects and the rest observe the
/// terminal state.
#[async_trait::async_trait]
pub trait PaymentLedger: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────
    // Collaborator lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Gets an account by ID.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Gets a property by ID.
    async fn get_property(&self, id: PropertyId) -> Result<Option<Property>, LedgerError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Transactions (MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────

    /// True when the property already has a successful non-inspection
    /// transaction.
    async fn has_qualifying_success(
        &self,
        property_id: PropertyId,
    ) -> Result<bool, LedgerError>;

    /// Records a new pending payment attempt.
    ///
    /// Fails with `NotFound` for a missing property or account, and with
    /// `DuplicatePayment` when the property already has a qualifying success
    /// and the new purpose is not an inspection fee.
    async fn create_pending(&self, new: NewPayment) -> Result<Transaction, LedgerError>;

    /// Finds a transaction by its provider-facing reference.
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Moves a pending transaction to the outcome's terminal state and
    /// applies the side effects, exactly once.
    ///
    /// This is the idempotency boundary shared by client-initiated
    /// verification and provider webhooks: an already-terminal transaction is
    /// returned unchanged with `newly_applied = false`. On success for a
    /// non-inspection purpose the access grant is inserted and the property
    /// marked paid and publicized; on failure the property's `paid` flag is
    /// recomputed from the surviving successful transactions.
    async fn apply_outcome(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Reconciliation, LedgerError>;

    /// Finds the access grant created for a transaction, if any.
    async fn find_grant_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<PropertyGrant>, LedgerError>;

    /// Lists a payer's transactions, newest first, with the total count.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Transaction>, i64), LedgerError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange rates
    // ─────────────────────────────────────────────────────────────────────────

    /// Reads the current exchange-rate snapshot, if one exists.
    async fn current_rates(&self) -> Result<Option<RateSnapshot>, LedgerError>;

    /// Upserts the single snapshot row. Idempotent per calendar day; the
    /// upstream fetch that produces the numbers lives outside this core.
    async fn refresh_rates(
        &self,
        usd: f64,
        eur: f64,
        gbp: f64,
        date: NaiveDate,
    ) -> Result<RateSnapshot, LedgerError>;
}
