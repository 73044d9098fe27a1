//! Payment reference generation and commission calculation.

use rand::Rng;

/// Platform commission rate in permille (2.5%).
const COMMISSION_PERMILLE: i64 = 25;

/// Generates a provider-facing payment reference.
///
/// Millisecond timestamp plus four random bytes keeps references unique
/// across concurrent calls; the UNIQUE index on `transactions.reference`
/// backstops the residual collision odds.
pub fn generate_reference() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let entropy: [u8; 4] = rand::rng().random();
    format!("REF-{}-{}", millis, hex::encode(entropy))
}

/// Computes the platform commission on a base-currency amount.
///
/// 2.5% of the amount in kobo, rounded half-up to the nearest kobo, taken
/// before any display-currency conversion.
pub fn calculate_commission(amount: i64) -> i64 {
    (amount * COMMISSION_PERMILLE + 500) / 1000
}
