//! Budget ledger - approved allocations and surpluses per (sector, unit).
//!
//! The effective capacity of a pair is its approved allocation plus every
//! surplus ever registered for it. A pair without an allocation row has an
//! approved amount of zero. These functions do no locking of their own; the
//! service layer calls them inside a transaction while holding the pair's lock.

use crate::{
    core::{
        BudgetKey,
        audit::{self, AuditAction},
        users,
    },
    entities::{BudgetAllocation, BudgetSurplus, budget_allocation, budget_surplus},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{debug, info};

/// Capacity breakdown for one (sector, unit) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capacity {
    /// Approved allocation (zero when none was registered)
    pub approved: Money,
    /// Sum of all registered surpluses
    pub surplus_total: Money,
}

impl Capacity {
    /// `approved + surplus_total`, or `InvalidInput` when the sum does not fit.
    pub fn effective(&self) -> Result<Money> {
        self.approved.try_add(self.surplus_total)
    }
}

/// Creates or replaces the approved allocation of `key`.
///
/// Calling this repeatedly with the same amount leaves a single row and the
/// same capacity. The new capacity must stay representable.
pub async fn upsert_allocation<C>(
    db: &C,
    key: &BudgetKey,
    approved: Money,
) -> Result<budget_allocation::Model>
where
    C: ConnectionTrait,
{
    if approved.is_negative() {
        return Err(Error::InvalidAmount { amount: approved });
    }
    approved.try_add(capacity(db, key).await?.surplus_total)?;

    let now = chrono::Utc::now();
    let allocation = match get_allocation(db, key).await? {
        Some(existing) => {
            let mut active: budget_allocation::ActiveModel = existing.into();
            active.approved_cents = Set(approved.cents());
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            budget_allocation::ActiveModel {
                sector: Set(key.sector().to_string()),
                unit: Set(key.unit().to_string()),
                approved_cents: Set(approved.cents()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    audit::record(
        db,
        "budget_allocations",
        allocation.id,
        AuditAction::Upsert,
        None,
        &allocation,
    )
    .await?;

    info!(%key, approved = %approved, "Allocation written");
    Ok(allocation)
}

/// Returns the allocation row of `key`, if any.
pub async fn get_allocation<C>(db: &C, key: &BudgetKey) -> Result<Option<budget_allocation::Model>>
where
    C: ConnectionTrait,
{
    BudgetAllocation::find()
        .filter(budget_allocation::Column::Sector.eq(key.sector()))
        .filter(budget_allocation::Column::Unit.eq(key.unit()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Appends an immutable surplus to `key`.
///
/// The amount is validated first, then the approver, then the justification.
/// A surplus that would push capacity out of range is refused. Nothing is
/// written if any check fails.
pub async fn add_surplus<C>(
    db: &C,
    key: &BudgetKey,
    additional: Money,
    justification: &str,
    approved_by: &str,
) -> Result<budget_surplus::Model>
where
    C: ConnectionTrait,
{
    if !additional.is_positive() {
        return Err(Error::InvalidAmount { amount: additional });
    }
    users::ensure_approver(db, approved_by).await?;
    if justification.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "surplus justification cannot be empty".to_string(),
        });
    }
    capacity(db, key).await?.effective()?.try_add(additional)?;

    let surplus = budget_surplus::ActiveModel {
        sector: Set(key.sector().to_string()),
        unit: Set(key.unit().to_string()),
        additional_cents: Set(additional.cents()),
        justification: Set(justification.trim().to_string()),
        approved_by: Set(approved_by.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    audit::record(
        db,
        "budget_surpluses",
        surplus.id,
        AuditAction::Insert,
        Some(approved_by),
        &surplus,
    )
    .await?;

    info!(%key, additional = %additional, approved_by, "Surplus registered");
    Ok(surplus)
}

/// Lists the surpluses of `key`, oldest first.
pub async fn list_surpluses<C>(db: &C, key: &BudgetKey) -> Result<Vec<budget_surplus::Model>>
where
    C: ConnectionTrait,
{
    BudgetSurplus::find()
        .filter(budget_surplus::Column::Sector.eq(key.sector()))
        .filter(budget_surplus::Column::Unit.eq(key.unit()))
        .order_by_asc(budget_surplus::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Approved allocation and surplus total of `key`.
pub async fn capacity<C>(db: &C, key: &BudgetKey) -> Result<Capacity>
where
    C: ConnectionTrait,
{
    let approved = get_allocation(db, key)
        .await?
        .map_or(Money::ZERO, |allocation| {
            Money::from_cents(allocation.approved_cents)
        });

    let surplus_cents: Vec<i64> = BudgetSurplus::find()
        .select_only()
        .column(budget_surplus::Column::AdditionalCents)
        .filter(budget_surplus::Column::Sector.eq(key.sector()))
        .filter(budget_surplus::Column::Unit.eq(key.unit()))
        .into_tuple()
        .all(db)
        .await?;
    let surplus_total = Money::try_sum(surplus_cents.into_iter().map(Money::from_cents))?;

    let capacity = Capacity {
        approved,
        surplus_total,
    };
    debug!(%key, approved = %capacity.approved, surplus = %capacity.surplus_total, "Capacity computed");
    Ok(capacity)
}

/// `approvedAmount + sum(surpluses)` for `key`.
pub async fn effective_capacity<C>(db: &C, key: &BudgetKey) -> Result<Money>
where
    C: ConnectionTrait,
{
    capacity(db, key).await?.effective()
}
