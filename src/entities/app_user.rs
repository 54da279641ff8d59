//! Application user entity - The directory used to resolve surplus approvers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// External identity (login or hosted auth id)
    #[sea_orm(unique)]
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Role: `"admin"` or `"staff"`
    pub role: String,
    /// Deactivated users cannot approve anything
    pub is_active: bool,
}

/// Users have no foreign-key relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
