//! Sector overview - budget usage per budgetary unit.
//!
//! Read-only aggregation over allocations, surpluses and active records of one
//! sector. Units appear when any of the three mentions them.

use crate::{
    core::{BudgetKey, lifecycle::Stage, reservation},
    entities::{
        BudgetAllocation, BudgetSurplus, ProcurementRecord, budget_allocation, budget_surplus,
        procurement_record,
    },
    errors::{Error, Result},
    money::Money,
};
use sea_orm::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Budget usage of one (sector, unit) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOverview {
    /// Budgetary unit
    pub unit: String,
    /// Approved allocation
    pub approved_amount: Money,
    /// Sum of surpluses
    pub surplus_total: Money,
    /// Reserved by active records
    pub reserved_amount: Money,
    /// `approved + surplus - reserved`; negative when an allocation was cut below reservations
    pub available: Money,
}

/// Budget usage of a sector, one entry per unit ordered by unit name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectorOverview {
    /// Sector name
    pub sector: String,
    /// Per-unit figures
    pub units: Vec<UnitOverview>,
}

impl SectorOverview {
    /// Figures for `unit`, if the sector has any.
    #[must_use]
    pub fn unit(&self, unit: &str) -> Option<&UnitOverview> {
        self.units.iter().find(|entry| entry.unit == unit)
    }
}

fn entry<'a>(units: &'a mut BTreeMap<String, UnitOverview>, unit: &str) -> &'a mut UnitOverview {
    units
        .entry(unit.to_string())
        .or_insert_with(|| UnitOverview {
            unit: unit.to_string(),
            ..UnitOverview::default()
        })
}

/// Builds the overview of `sector`.
pub async fn sector_overview<C>(db: &C, sector: &str) -> Result<SectorOverview>
where
    C: ConnectionTrait,
{
    let sector = sector.trim();
    if sector.is_empty() {
        return Err(Error::InvalidInput {
            message: "sector cannot be empty".to_string(),
        });
    }

    let allocations = BudgetAllocation::find()
        .filter(budget_allocation::Column::Sector.eq(sector))
        .all(db)
        .await?;
    let surpluses = BudgetSurplus::find()
        .filter(budget_surplus::Column::Sector.eq(sector))
        .all(db)
        .await?;
    let records = ProcurementRecord::find()
        .filter(procurement_record::Column::Sector.eq(sector))
        .filter(procurement_record::Column::Stage.ne(Stage::Cancelled.as_str()))
        .all(db)
        .await?;

    let mut units: BTreeMap<String, UnitOverview> = BTreeMap::new();
    for allocation in &allocations {
        entry(&mut units, &allocation.unit).approved_amount =
            Money::from_cents(allocation.approved_cents);
    }
    for surplus in &surpluses {
        let overview = entry(&mut units, &surplus.unit);
        overview.surplus_total = overview
            .surplus_total
            .try_add(Money::from_cents(surplus.additional_cents))?;
    }
    for record in &records {
        let contribution = reservation::record_contribution(record)?;
        let overview = entry(&mut units, &record.unit);
        overview.reserved_amount = overview.reserved_amount.try_add(contribution)?;
    }

    let units = units
        .into_values()
        .map(|mut overview| {
            overview.available = overview
                .approved_amount
                .try_add(overview.surplus_total)?
                .try_sub(overview.reserved_amount)?;
            Ok(overview)
        })
        .collect::<Result<_>>()?;

    Ok(SectorOverview {
        sector: sector.to_string(),
        units,
    })
}

/// Overview of a single (sector, unit) pair.
pub async fn unit_overview<C>(db: &C, key: &BudgetKey) -> Result<UnitOverview>
where
    C: ConnectionTrait,
{
    let overview = sector_overview(db, key.sector()).await?;
    Ok(overview.unit(key.unit()).cloned().unwrap_or_else(|| UnitOverview {
        unit: key.unit().to_string(),
        ..UnitOverview::default()
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::ledger::{add_surplus, upsert_allocation},
        test_utils::{insert_raw_record, register_admin, setup_test_db},
    };

    #[tokio::test]
    async fn test_sector_overview_integration() -> Result<()> {
        let db = setup_test_db().await?;
        register_admin(&db, "boss").await?;
        let units = Money::from_units;

        let pgj = BudgetKey::new("CTI", "PGJ")?;
        let fundo = BudgetKey::new("CTI", "FUNDO")?;
        upsert_allocation(&db, &pgj, units(100_000)).await?;
        upsert_allocation(&db, &fundo, units(5_000)).await?;
        upsert_allocation(&db, &BudgetKey::new("RH", "PGJ")?, units(1)).await?;
        add_surplus(&db, &pgj, units(30_000), "Extra", "boss").await?;

        insert_raw_record(&db, "CTI", "PGJ", Stage::Planning, units(50_000), None).await?;
        insert_raw_record(&db, "CTI", "PGJ", Stage::Cancelled, units(60_000), None).await?;
        insert_raw_record(&db, "CTI", "PGJ", Stage::Completed, units(10), Some(units(8))).await?;
        insert_raw_record(&db, "CTI", "LOOSE", Stage::InBidding, units(7), None).await?;

        let overview = sector_overview(&db, " CTI ").await?;
        assert_eq!(overview.sector, "CTI");
        let names: Vec<&str> = overview.units.iter().map(|u| u.unit.as_str()).collect();
        assert_eq!(names, ["FUNDO", "LOOSE", "PGJ"]);

        let pgj_row = overview.unit("PGJ").unwrap();
        assert_eq!(pgj_row.approved_amount, units(100_000));
        assert_eq!(pgj_row.surplus_total, units(30_000));
        assert_eq!(pgj_row.reserved_amount, units(50_008));
        assert_eq!(pgj_row.available, units(79_992));

        let loose = overview.unit("LOOSE").unwrap();
        assert_eq!(loose.approved_amount, Money::ZERO);
        assert_eq!(loose.available, units(-7));

        let fundo_row = unit_overview(&db, &fundo).await?;
        assert_eq!(fundo_row.available, units(5_000));
        Ok(())
    }

    #[tokio::test]
    async fn test_overview_serializes_camel_case() -> Result<()> {
        let db = setup_test_db().await?;
        let key = BudgetKey::new("CTI", "PGJ")?;
        upsert_allocation(&db, &key, Money::from_units(10)).await?;

        let overview = unit_overview(&db, &key).await?;
        let json = serde_json::to_value(&overview)?;
        assert_eq!(json["approvedAmount"], "10.00");
        assert_eq!(json["surplusTotal"], "0.00");
        assert_eq!(json["reservedAmount"], "0.00");
        assert_eq!(json["available"], "10.00");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_sector_is_empty() -> Result<()> {
        let db = setup_test_db().await?;
        let overview = sector_overview(&db, "NOPE").await?;
        assert!(overview.units.is_empty());
        Ok(())
    }
}
