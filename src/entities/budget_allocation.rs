//! Budget allocation entity - The approved budget for one (sector, unit) pair.
//!
//! At most one row exists per pair; writes go through an upsert keyed on
//! `sector` and `unit` (backed by a composite unique index).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    /// Unique identifier for the allocation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting sector (e.g. "CTI")
    pub sector: String,
    /// Budgetary unit / funding source (e.g. "PGJ")
    pub unit: String,
    /// Approved amount in cents
    pub approved_cents: i64,
    /// When the allocation was first created
    pub created_at: DateTimeUtc,
    /// When the approved amount was last written
    pub updated_at: DateTimeUtc,
}

/// Budget allocations are joined to records and surpluses by key, not by id
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
