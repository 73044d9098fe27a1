//! Payment purposes and their pricing rules.
//!
//! Each purpose maps to exactly one price field on the property and one
//! duration unit for the access grant. Resolving both through this table
//! keeps pricing in a single place instead of ad hoc branches per endpoint.

use serde::{Deserialize, Serialize};

use super::property::Property;
use crate::error::DomainError;

/// The business reason for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    InspectionFee,
    Rent,
    Sale,
    Shortlet,
}

/// Which property field a purpose charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    InspectionFee,
    TotalPrice,
}

/// How a purpose's grant window is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    /// No access grant (inspection fees).
    None,
    Months,
    Days,
    /// A sale grant that effectively never expires.
    Permanent,
}

/// Pricing rule resolved from the purpose table.
#[derive(Debug, Clone, Copy)]
pub struct PricingRule {
    pub amount_field: AmountField,
    pub duration_unit: DurationUnit,
}

impl Purpose {
    /// The purpose → (amount field, duration unit) table.
    pub const fn pricing(&self) -> PricingRule {
        match self {
            Purpose::InspectionFee => PricingRule {
                amount_field: AmountField::InspectionFee,
                duration_unit: DurationUnit::None,
            },
            Purpose::Rent => PricingRule {
                amount_field: AmountField::TotalPrice,
                duration_unit: DurationUnit::Months,
            },
            Purpose::Sale => PricingRule {
                amount_field: AmountField::TotalPrice,
                duration_unit: DurationUnit::Permanent,
            },
            Purpose::Shortlet => PricingRule {
                amount_field: AmountField::TotalPrice,
                duration_unit: DurationUnit::Days,
            },
        }
    }

    /// The amount this purpose charges for the given property, in kobo.
    pub fn amount_for(&self, property: &Property) -> i64 {
        match self.pricing().amount_field {
            AmountField::InspectionFee => property.inspection_fee,
            AmountField::TotalPrice => property.total_price,
        }
    }

    /// Inspection fees never mark a property paid and never earn a grant.
    pub fn grants_access(&self) -> bool {
        !matches!(self, Purpose::InspectionFee)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::InspectionFee => "inspection_fee",
            Purpose::Rent => "rent",
            Purpose::Sale => "sale",
            Purpose::Shortlet => "shortlet",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Purpose {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inspection_fee" => Ok(Purpose::InspectionFee),
            "rent" => Ok(Purpose::Rent),
            "sale" => Ok(Purpose::Sale),
            "shortlet" => Ok(Purpose::Shortlet),
            _ => Err(DomainError::UnsupportedPurpose(s.to_string())),
        }
    }
}

/// Checks whether a purpose is legal for the property's current pricing.
///
/// Deterministic and side-effect free: an inspection fee requires the
/// property to have one set, everything else requires an asking price.
pub fn validate_purpose(purpose: Purpose, property: &Property) -> Result<(), DomainError> {
    match purpose.pricing().amount_field {
        AmountField::InspectionFee if property.inspection_fee <= 0 => {
            Err(DomainError::InspectionFeeNotSet)
        }
        AmountField::TotalPrice if property.total_price <= 0 => Err(DomainError::PriceNotSet),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, ListingCategory, PropertyId};
    use chrono::Utc;

    fn property(total_price: i64, inspection_fee: i64) -> Property {
        Property::from_parts(
            PropertyId::new(),
            AccountId::new(),
            "3-bed duplex, Lekki".to_string(),
            total_price,
            total_price,
            inspection_fee,
            false,
            false,
            ListingCategory::Rent,
            "house".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_purpose_parse() {
        assert_eq!("rent".parse::<Purpose>().unwrap(), Purpose::Rent);
        assert_eq!(
            "inspection_fee".parse::<Purpose>().unwrap(),
            Purpose::InspectionFee
        );
        assert!(matches!(
            "mortgage".parse::<Purpose>(),
            Err(DomainError::UnsupportedPurpose(_))
        ));
    }

    #[test]
    fn test_inspection_requires_fee_set() {
        let with_fee = property(120_000_00, 5_000_00);
        let without_fee = property(120_000_00, 0);

        assert!(validate_purpose(Purpose::InspectionFee, &with_fee).is_ok());
        assert!(matches!(
            validate_purpose(Purpose::InspectionFee, &without_fee),
            Err(DomainError::InspectionFeeNotSet)
        ));
    }

    #[test]
    fn test_priced_purposes_require_total_price() {
        let unpriced = property(0, 5_000_00);

        for purpose in [Purpose::Rent, Purpose::Sale, Purpose::Shortlet] {
            assert!(matches!(
                validate_purpose(purpose, &unpriced),
                Err(DomainError::PriceNotSet)
            ));
        }

        let priced = property(120_000_00, 0);
        for purpose in [Purpose::Rent, Purpose::Sale, Purpose::Shortlet] {
            assert!(validate_purpose(purpose, &priced).is_ok());
        }
    }

    #[test]
    fn test_amount_resolves_from_pricing_table() {
        let p = property(120_000_00, 5_000_00);

        assert_eq!(Purpose::InspectionFee.amount_for(&p), 5_000_00);
        assert_eq!(Purpose::Rent.amount_for(&p), 120_000_00);
        assert_eq!(Purpose::Sale.amount_for(&p), 120_000_00);
        assert_eq!(Purpose::Shortlet.amount_for(&p), 120_000_00);
    }

    #[test]
    fn test_only_inspection_skips_access_grant() {
        assert!(!Purpose::InspectionFee.grants_access());
        assert!(Purpose::Rent.grants_access());
        assert!(Purpose::Sale.grants_access());
        assert!(Purpose::Shortlet.grants_access());
    }
}
