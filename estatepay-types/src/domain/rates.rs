//! Daily exchange-rate snapshot and display-currency conversion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Currency;

/// The single current row of base-to-display currency multipliers.
///
/// Refreshed at most once per calendar day by an external job; this core
/// only ever reads it. Rates are "units of target currency per one naira".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub id: Uuid,
    pub usd: f64,
    pub eur: f64,
    pub gbp: f64,
    pub last_updated: NaiveDate,
}

impl RateSnapshot {
    /// Multiplier from the base currency into `currency`.
    pub fn rate_for(&self, currency: Currency) -> f64 {
        match currency {
            Currency::NGN => 1.0,
            Currency::USD => self.usd,
            Currency::EUR => self.eur,
            Currency::GBP => self.gbp,
        }
    }

    /// Converts a base-currency amount in kobo into `currency` minor units,
    /// rounded to the nearest minor unit. Identity for the base currency.
    pub fn convert(&self, amount: i64, currency: Currency) -> i64 {
        if currency.is_base() {
            return amount;
        }
        (amount as f64 * self.rate_for(currency)).round() as i64
    }

    /// True when the snapshot was refreshed on the given day.
    pub fn is_fresh(&self, today: NaiveDate) -> bool {
        self.last_updated == today
    }
}
