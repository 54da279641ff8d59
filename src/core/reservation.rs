//! Reservation accountant.
//!
//! Sums what the active procurement records of a (sector, unit) pair currently
//! reserve. The sum is always recomputed from the records; nothing is cached,
//! so a check made inside a transaction sees every committed reservation.

use crate::{
    core::{
        BudgetKey,
        lifecycle::{self, Stage},
    },
    entities::{ProcurementRecord, procurement_record},
    errors::Result,
    money::Money,
};
use sea_orm::prelude::*;
use tracing::debug;

/// What a stored record reserves right now.
pub fn record_contribution(record: &procurement_record::Model) -> Result<Money> {
    let stage: Stage = record.stage.parse()?;
    Ok(lifecycle::contribution(
        stage,
        Money::from_cents(record.estimated_cents),
        record.contracted_cents.map(Money::from_cents),
    ))
}

/// Total reserved by `records`, skipping the record with id `excluding`.
pub fn sum_reserved<'a, I>(records: I, excluding: Option<i64>) -> Result<Money>
where
    I: IntoIterator<Item = &'a procurement_record::Model>,
{
    records
        .into_iter()
        .filter(|record| Some(record.id) != excluding)
        .try_fold(Money::ZERO, |total, record| {
            total.try_add(record_contribution(record)?)
        })
}

/// Amount reserved by the active records of `key`.
///
/// `excluding` leaves one record out, so an update can be checked against the
/// other reservations before its own new contribution is added.
pub async fn reserved_amount<C>(db: &C, key: &BudgetKey, excluding: Option<i64>) -> Result<Money>
where
    C: ConnectionTrait,
{
    let records = ProcurementRecord::find()
        .filter(procurement_record::Column::Sector.eq(key.sector()))
        .filter(procurement_record::Column::Unit.eq(key.unit()))
        .filter(procurement_record::Column::Stage.ne(Stage::Cancelled.as_str()))
        .all(db)
        .await?;

    let reserved = sum_reserved(&records, excluding)?;
    debug!(%key, records = records.len(), reserved = %reserved, "Reservation computed");
    Ok(reserved)
}
