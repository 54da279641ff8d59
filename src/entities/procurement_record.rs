//! Procurement record entity - A contracting demand registered in the plan.
//!
//! The `stage` column holds the snake_case name of a
//! [`Stage`](crate::core::lifecycle::Stage). Records are never physically
//! deleted; cancellation is a stage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Procurement record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "procurement_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What is being procured
    pub description: String,
    /// Requesting sector
    pub sector: String,
    /// Budgetary unit charged
    pub unit: String,
    /// Estimated value in cents, always positive
    pub estimated_cents: i64,
    /// Contracted value in cents, once known
    pub contracted_cents: Option<i64>,
    /// Lifecycle stage: `"planning"`, `"in_bidding"`, `"contracted"`, `"completed"` or `"cancelled"`
    pub stage: String,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Records reference allocations through the (sector, unit) key
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
