//! Admission check - the gate in front of every reservation increase.
//!
//! A commitment of `requested` is admitted when
//! `reserved + requested <= capacity`; equality is admitted. The sum is taken
//! in `i128`, so amounts near the `i64` limit are rejected, never wrapped. The
//! decision itself is [`evaluate`], a pure function, so it can be exercised
//! without a store. [`check`] gathers capacity and reservations through the caller's
//! connection, which must be the transaction that will write the record.

use crate::{
    core::{BudgetKey, ledger, reservation},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{debug, warn};

/// Inputs and result of an admitted check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Admission {
    /// Effective capacity of the pair
    pub capacity: Money,
    /// Reserved by other active records
    pub reserved: Money,
    /// Amount being admitted
    pub requested: Money,
}

impl Admission {
    /// Capacity left after the admitted commitment.
    #[must_use]
    pub const fn remaining(&self) -> Money {
        self.capacity
            .saturating_sub(self.reserved)
            .saturating_sub(self.requested)
    }
}

/// Decides whether `requested` fits next to `reserved` within `capacity`.
pub fn evaluate(
    key: &BudgetKey,
    capacity: Money,
    reserved: Money,
    requested: Money,
) -> Result<Admission> {
    let total = i128::from(reserved.cents()) + i128::from(requested.cents());
    if total > i128::from(capacity.cents()) {
        warn!(
            %key,
            capacity = %capacity,
            reserved = %reserved,
            requested = %requested,
            "Admission rejected"
        );
        return Err(Error::BudgetExceeded {
            sector: key.sector().to_string(),
            unit: key.unit().to_string(),
            reserved,
            requested,
            capacity,
        });
    }

    debug!(%key, capacity = %capacity, reserved = %reserved, requested = %requested, "Admitted");
    Ok(Admission {
        capacity,
        reserved,
        requested,
    })
}

/// Loads capacity and current reservations of `key` and evaluates `requested`.
///
/// `excluding` is the id of the record being updated, whose prior
/// contribution must not be counted twice.
pub async fn check<C>(
    db: &C,
    key: &BudgetKey,
    requested: Money,
    excluding: Option<i64>,
) -> Result<Admission>
where
    C: ConnectionTrait,
{
    let capacity = ledger::effective_capacity(db, key).await?;
    let reserved = reservation::reserved_amount(db, key, excluding).await?;
    evaluate(key, capacity, reserved, requested)
}
