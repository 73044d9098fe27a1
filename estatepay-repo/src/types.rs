//! Database row structs and domain conversion.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use estatepay_types::domain::{
    Account, AccountId, Currency, GrantTerm, ListingCategory, Money, Property, PropertyGrant,
    PropertyId, Purpose, RateSnapshot, Role, Transaction, TransactionId, TransactionStatus,
};
use estatepay_types::error::LedgerError;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Account row from database.
#[derive(FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Property row from database.
#[derive(FromRow)]
pub struct DbProperty {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub total_price: i64,
    pub price_per_year: i64,
    pub inspection_fee: i64,
    pub paid: bool,
    pub publicized: bool,
    pub category: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: Uuid,
    pub reference: String,
    pub property_id: Uuid,
    pub account_id: Uuid,
    pub purpose: String,
    pub amount: i64,
    pub currency: String,
    pub commission: i64,
    pub status: String,
    pub duration_months: i32,
    pub duration_days: i32,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Access grant row from database.
#[derive(FromRow)]
pub struct DbPropertyGrant {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub property_id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub duration_months: i32,
    pub duration_days: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

/// Exchange-rate snapshot row from database.
#[derive(FromRow)]
pub struct DbRateSnapshot {
    pub id: Uuid,
    pub usd: f64,
    pub eur: f64,
    pub gbp: f64,
    pub last_updated: NaiveDate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_currency(s: &str) -> Result<Currency, LedgerError> {
    s.parse()
        .map_err(|_| LedgerError::Database(format!("Unknown currency: {}", s)))
}

pub fn parse_purpose(s: &str) -> Result<Purpose, LedgerError> {
    s.parse()
        .map_err(|_| LedgerError::Database(format!("Unknown purpose: {}", s)))
}

pub fn parse_status(s: &str) -> Result<TransactionStatus, LedgerError> {
    match s {
        "pending" => Ok(TransactionStatus::Pending),
        "success" => Ok(TransactionStatus::Success),
        "failed" => Ok(TransactionStatus::Failed),
        _ => Err(LedgerError::Database(format!("Unknown status: {}", s))),
    }
}

pub fn parse_role(s: &str) -> Result<Role, LedgerError> {
    match s {
        "customer" => Ok(Role::Customer),
        "agent" => Ok(Role::Agent),
        "admin" => Ok(Role::Admin),
        _ => Err(LedgerError::Database(format!("Unknown role: {}", s))),
    }
}

pub fn parse_category(s: &str) -> Result<ListingCategory, LedgerError> {
    match s {
        "sale" => Ok(ListingCategory::Sale),
        "rent" => Ok(ListingCategory::Rent),
        "shortlet" => Ok(ListingCategory::Shortlet),
        _ => Err(LedgerError::Database(format!("Unknown category: {}", s))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbAccount {
    /// Convert database row to domain Account.
    pub fn into_domain(self) -> Result<Account, LedgerError> {
        let role = parse_role(&self.role)?;
        Ok(Account::from_parts(
            AccountId::from_uuid(self.id),
            self.email,
            role,
            self.created_at,
        ))
    }
}

impl DbProperty {
    /// Convert database row to domain Property.
    pub fn into_domain(self) -> Result<Property, LedgerError> {
        let category = parse_category(&self.category)?;
        Ok(Property::from_parts(
            PropertyId::from_uuid(self.id),
            AccountId::from_uuid(self.owner_id),
            self.name,
            self.total_price,
            self.price_per_year,
            self.inspection_fee,
            self.paid,
            self.publicized,
            category,
            self.kind,
            self.created_at,
        ))
    }
}

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, LedgerError> {
        let purpose = parse_purpose(&self.purpose)?;
        let status = parse_status(&self.status)?;
        let display_currency = parse_currency(&self.currency)?;
        let amount =
            Money::new(self.amount, Currency::BASE).map_err(LedgerError::Domain)?;

        Ok(Transaction::from_parts(
            TransactionId::from_uuid(self.id),
            self.reference,
            PropertyId::from_uuid(self.property_id),
            AccountId::from_uuid(self.account_id),
            purpose,
            amount,
            display_currency,
            self.commission,
            status,
            GrantTerm {
                months: self.duration_months.max(0) as u32,
                days: self.duration_days.max(0) as u32,
            },
            self.start_date,
            self.created_at,
            self.updated_at,
        ))
    }
}

impl DbPropertyGrant {
    /// Convert database row to domain PropertyGrant.
    pub fn into_domain(self) -> PropertyGrant {
        PropertyGrant {
            id: self.id,
            transaction_id: TransactionId::from_uuid(self.transaction_id),
            property_id: PropertyId::from_uuid(self.property_id),
            account_id: AccountId::from_uuid(self.account_id),
            amount: self.amount,
            duration_months: self.duration_months.max(0) as u32,
            duration_days: self.duration_days.max(0) as u32,
            start_date: self.start_date,
            end_date: self.end_date,
            expired: self.expired,
            created_at: self.created_at,
        }
    }
}

impl DbRateSnapshot {
    /// Convert database row to domain RateSnapshot.
    pub fn into_domain(self) -> RateSnapshot {
        RateSnapshot {
            id: self.id,
            usd: self.usd,
            eur: self.eur,
            gbp: self.gbp,
            last_updated: self.last_updated,
        }
    }
}
