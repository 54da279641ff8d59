//! Core business logic - framework-agnostic budget ledger, reservations,
//! admission and record lifecycle.
//!
//! Functions here are generic over `sea_orm::ConnectionTrait` so they run
//! unchanged on a plain connection or inside a transaction.

/// Admission check against effective capacity
pub mod admission;
/// JSON snapshot audit trail
pub mod audit;
/// Allocations, surpluses and effective capacity
pub mod ledger;
/// Record stages and reservation basis
pub mod lifecycle;
/// Per-sector budget usage
pub mod overview;
/// Procurement record inserts, updates and queries
pub mod record;
/// Reservation accountant
pub mod reservation;
/// Approver directory
pub mod users;

use crate::errors::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Composite (sector, budgetary unit) key shared by allocations, surpluses
/// and records. Both parts are trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BudgetKey {
    sector: String,
    unit: String,
}

impl BudgetKey {
    /// Builds a key, trimming both parts.
    pub fn new(sector: &str, unit: &str) -> Result<Self> {
        let sector = sector.trim();
        let unit = unit.trim();
        if sector.is_empty() || unit.is_empty() {
            return Err(Error::InvalidInput {
                message: format!("sector and unit are required (got '{sector}' / '{unit}')"),
            });
        }
        Ok(Self {
            sector: sector.to_string(),
            unit: unit.to_string(),
        })
    }

    /// Requesting sector.
    #[must_use]
    pub fn sector(&self) -> &str {
        &self.sector
    }

    /// Budgetary unit.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.sector, self.unit)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_budget_key_trims_and_validates() {
        let key = BudgetKey::new(" CTI ", "PGJ\t").unwrap();
        assert_eq!(key.sector(), "CTI");
        assert_eq!(key.unit(), "PGJ");
        assert_eq!(key.to_string(), "CTI/PGJ");

        assert!(BudgetKey::new("", "PGJ").is_err());
        assert!(BudgetKey::new("CTI", "   ").is_err());
    }
}
