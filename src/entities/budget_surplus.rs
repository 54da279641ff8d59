//! Budget surplus entity - An approved one-time increase ("excedente") to the
//! capacity of a (sector, unit) pair.
//!
//! Rows are append-only: the engine never updates or deletes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget surplus database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_surpluses")]
pub struct Model {
    /// Unique identifier for the surplus
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting sector
    pub sector: String,
    /// Budgetary unit
    pub unit: String,
    /// Additional capacity in cents, always positive
    pub additional_cents: i64,
    /// Why the surplus was granted
    pub justification: String,
    /// `user_id` of the administrator who approved it
    pub approved_by: String,
    /// When the surplus was registered
    pub created_at: DateTimeUtc,
}

/// Surpluses reference allocations through the (sector, unit) key
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
