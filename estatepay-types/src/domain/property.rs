//! Property listing domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;

/// Unique identifier for a Property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct PropertyId(Uuid);

impl PropertyId {
    /// Creates a new random PropertyId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PropertyId from an existing UUID.
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

impl Default for PropertyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PropertyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How a listing is offered on the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingCategory {
    Sale,
    Rent,
    Shortlet,
}

impl ListingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingCategory::Sale => "sale",
            ListingCategory::Rent => "rent",
            ListingCategory::Shortlet => "shortlet",
        }
    }
}

impl std::fmt::Display for ListingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A listing owned by one agent account.
///
/// `paid` is derived state: it is true only while at least one successful
/// non-inspection transaction exists for the property. The reconciliation
/// path recomputes it from the transaction ledger rather than toggling it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    /// Agent account that owns the listing.
    pub owner_id: AccountId,
    pub name: String,
    /// Asking price in kobo (NGN minor units).
    pub total_price: i64,
    /// Annual rate in kobo, informational for rent listings.
    pub price_per_year: i64,
    /// Fee charged for a physical inspection, in kobo. Zero when not offered.
    pub inspection_fee: i64,
    pub paid: bool,
    pub publicized: bool,
    pub category: ListingCategory,
    /// Physical kind of the listing (house, land, hostel).
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// Reconstructs a property from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PropertyId,
        owner_id: AccountId,
        name: String,
        total_price: i64,
        price_per_year: i64,
        inspection_fee: i64,
        paid: bool,
        publicized: bool,
        category: ListingCategory,
        kind: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            total_price,
            price_per_year,
            inspection_fee,
            paid,
            publicized,
            category,
            kind,
            created_at,
        }
    }
}
