//! Property access grants earned by successful payments.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::property::PropertyId;
use super::purpose::Purpose;
use super::transaction::TransactionId;

/// A sale grant runs for 100 years, effectively permanent.
const SALE_TENURE_MONTHS: u32 = 1200;

/// Requested grant duration, captured when a payment is initialized.
///
/// Which field applies is decided by the purpose's duration unit; the other
/// stays zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTerm {
    pub months: u32,
    pub days: u32,
}

impl GrantTerm {
    pub fn none() -> Self {
        Self { months: 0, days: 0 }
    }

    pub fn months(months: u32) -> Self {
        Self { months, days: 0 }
    }

    pub fn days(days: u32) -> Self {
        Self { months: 0, days }
    }
}

/// Computes the access window a successful payment earns.
///
/// Rent runs for the requested months, shortlets for the requested days,
/// sales for a century. Inspection fees earn no window at all.
pub fn grant_window(
    purpose: Purpose,
    term: GrantTerm,
    start: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end = match purpose {
        Purpose::InspectionFee => return None,
        Purpose::Rent => start.checked_add_months(Months::new(term.months))?,
        Purpose::Shortlet => start.checked_add_days(Days::new(term.days as u64))?,
        Purpose::Sale => start.checked_add_months(Months::new(SALE_TENURE_MONTHS))?,
    };
    Some((start, end))
}

/// The time-bounded access right a payer earns over a property.
///
/// Created exactly once per successful non-inspection transaction; the
/// UNIQUE constraint on the originating transaction id enforces that at the
/// storage layer as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyGrant {
    pub id: Uuid,
    pub transaction_id: TransactionId,
    pub property_id: PropertyId,
    pub account_id: AccountId,
    /// Amount paid, in kobo.
    pub amount: i64,
    pub duration_months: u32,
    pub duration_days: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Stored flag; authoritative expiry is evaluated lazily via `is_expired`.
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

impl PropertyGrant {
    /// Lazily evaluated expiry: a grant is expired once its window has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired || self.end_date < now
    }
}
