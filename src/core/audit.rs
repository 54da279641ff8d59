//! Audit trail - JSON snapshots of every committed write.
//!
//! Snapshots are appended through the same connection (usually an open
//! transaction) as the write they describe, so a rolled-back write never leaves
//! an audit row behind.

use crate::{
    entities::{AuditEntry, audit_entry},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;

/// Kind of write being audited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    /// Row created
    Insert,
    /// Row modified
    Update,
    /// Row created or replaced by key
    Upsert,
}

impl AuditAction {
    /// Name stored in the `action` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Upsert => "upsert",
        }
    }
}

/// Appends a snapshot of `row` for `entity`/`entity_id`.
pub async fn record<C, T>(
    db: &C,
    entity: &str,
    entity_id: i64,
    action: AuditAction,
    actor: Option<&str>,
    row: &T,
) -> Result<audit_entry::Model>
where
    C: ConnectionTrait,
    T: Serialize,
{
    let snapshot = serde_json::to_string(row)?;

    let entry = audit_entry::ActiveModel {
        entity: Set(entity.to_string()),
        entity_id: Set(entity_id),
        action: Set(action.as_str().to_string()),
        actor: Set(actor.map(str::to_string)),
        snapshot: Set(snapshot),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    entry.insert(db).await.map_err(Into::into)
}

/// Returns the audit history of one row, oldest first.
pub async fn history<C>(db: &C, entity: &str, entity_id: i64) -> Result<Vec<audit_entry::Model>>
where
    C: ConnectionTrait,
{
    AuditEntry::find()
        .filter(audit_entry::Column::Entity.eq(entity))
        .filter(audit_entry::Column::EntityId.eq(entity_id))
        .order_by_asc(audit_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
