//! Audit entry entity - JSON snapshot of a row after every committed write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_entries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Table the snapshot belongs to (e.g. `"procurement_records"`)
    pub entity: String,
    /// Primary key of the snapshotted row
    pub entity_id: i64,
    /// `"insert"`, `"update"` or `"upsert"`
    pub action: String,
    /// Who performed the write, when known
    pub actor: Option<String>,
    /// Row contents after the write, as JSON text
    pub snapshot: String,
    /// When the write was committed
    pub created_at: DateTimeUtc,
}

/// `AuditEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
