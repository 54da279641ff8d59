//! Procurement record business logic.
//!
//! Inserts and updates run the admission check whenever they would increase
//! what the record reserves. Decreases (including cancellation) never need
//! admission. Callers are expected to pass an open transaction and hold the
//! (sector, unit) lock, so the check and the write are one atomic step; a
//! rejected write persists nothing.

use crate::{
    core::{
        BudgetKey, admission,
        audit::{self, AuditAction},
        lifecycle::{self, Stage},
        reservation,
    },
    entities::{ProcurementRecord, procurement_record},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

const ENTITY: &str = "procurement_records";

/// A procurement record to be inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// What is being procured
    pub description: String,
    /// Requesting sector
    pub sector: String,
    /// Budgetary unit charged
    pub unit: String,
    /// Estimated value, must be positive
    pub estimated_value: Money,
    /// Contracted value, if already known
    #[serde(default)]
    pub contracted_value: Option<Money>,
    /// Initial stage; defaults to `Planning` and must not be terminal
    #[serde(default)]
    pub stage: Option<Stage>,
}

/// Changes to an existing record. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// New stage
    #[serde(default)]
    pub stage: Option<Stage>,
    /// New estimated value
    #[serde(default)]
    pub estimated_value: Option<Money>,
    /// New contracted value
    #[serde(default)]
    pub contracted_value: Option<Money>,
}

impl RecordPatch {
    /// Patch that only cancels the record.
    #[must_use]
    pub const fn cancel() -> Self {
        Self {
            stage: Some(Stage::Cancelled),
            estimated_value: None,
            contracted_value: None,
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stage.is_none() && self.estimated_value.is_none() && self.contracted_value.is_none()
    }
}

fn ensure_positive(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

impl NewRecord {
    /// Checks amounts, description and stage. Returns the record's key.
    pub fn validate(&self) -> Result<BudgetKey> {
        ensure_positive(self.estimated_value)?;
        if let Some(contracted) = self.contracted_value {
            ensure_positive(contracted)?;
        }
        if self.description.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "description cannot be empty".to_string(),
            });
        }
        if let Some(stage) = self.stage.filter(|stage| stage.is_terminal()) {
            return Err(Error::InvalidInput {
                message: format!("a record cannot be created as {stage}"),
            });
        }
        BudgetKey::new(&self.sector, &self.unit)
    }

    /// Stage the record starts in.
    #[must_use]
    pub fn initial_stage(&self) -> Stage {
        self.stage.unwrap_or(Stage::Planning)
    }

    /// What the record will reserve once inserted.
    #[must_use]
    pub fn contribution(&self) -> Money {
        lifecycle::contribution(
            self.initial_stage(),
            self.estimated_value,
            self.contracted_value,
        )
    }
}

/// Admits and inserts a new record.
pub async fn insert_record<C>(db: &C, new: &NewRecord) -> Result<procurement_record::Model>
where
    C: ConnectionTrait,
{
    let key = new.validate()?;
    let stage = new.initial_stage();
    let requested = new.contribution();

    let admission = admission::check(db, &key, requested, None).await?;

    let now = chrono::Utc::now();
    let record = procurement_record::ActiveModel {
        description: Set(new.description.trim().to_string()),
        sector: Set(key.sector().to_string()),
        unit: Set(key.unit().to_string()),
        estimated_cents: Set(new.estimated_value.cents()),
        contracted_cents: Set(new.contracted_value.map(Money::cents)),
        stage: Set(stage.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    audit::record(db, ENTITY, record.id, AuditAction::Insert, None, &record).await?;

    info!(
        id = record.id,
        %key,
        reserved = %requested,
        remaining = %admission.remaining(),
        "Procurement record admitted"
    );
    Ok(record)
}

/// Applies `patch` to record `id`.
///
/// Terminal records reject every patch. When the new contribution is larger
/// than the old one, the record is re-admitted against the other reservations
/// of its pair.
pub async fn update_record<C>(
    db: &C,
    id: i64,
    patch: &RecordPatch,
) -> Result<procurement_record::Model>
where
    C: ConnectionTrait,
{
    if patch.is_empty() {
        return Err(Error::InvalidInput {
            message: format!("nothing to update on record {id}"),
        });
    }

    let existing = get_record(db, id)
        .await?
        .ok_or(Error::RecordNotFound { id })?;
    let current: Stage = existing.stage.parse()?;
    let next = patch.stage.unwrap_or(current);
    current.ensure_transition(next)?;

    if let Some(estimated) = patch.estimated_value {
        ensure_positive(estimated)?;
    }
    if let Some(contracted) = patch.contracted_value {
        ensure_positive(contracted)?;
    }

    let estimated = patch
        .estimated_value
        .unwrap_or_else(|| Money::from_cents(existing.estimated_cents));
    let contracted = patch
        .contracted_value
        .or_else(|| existing.contracted_cents.map(Money::from_cents));

    let before = reservation::record_contribution(&existing)?;
    let after = lifecycle::contribution(next, estimated, contracted);

    let key = BudgetKey::new(&existing.sector, &existing.unit)?;
    if after > before {
        admission::check(db, &key, after, Some(id)).await?;
    }

    let mut active: procurement_record::ActiveModel = existing.into();
    active.stage = Set(next.as_str().to_string());
    active.estimated_cents = Set(estimated.cents());
    active.contracted_cents = Set(contracted.map(Money::cents));
    active.updated_at = Set(chrono::Utc::now());
    let record = active.update(db).await?;

    audit::record(db, ENTITY, record.id, AuditAction::Update, None, &record).await?;

    info!(
        id,
        %key,
        from = %current,
        to = %next,
        reserved_before = %before,
        reserved_after = %after,
        "Procurement record updated"
    );
    Ok(record)
}

/// Retrieves a record by id.
pub async fn get_record<C>(db: &C, id: i64) -> Result<Option<procurement_record::Model>>
where
    C: ConnectionTrait,
{
    ProcurementRecord::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the records of `key`, newest first. Cancelled records are included.
pub async fn list_records<C>(db: &C, key: &BudgetKey) -> Result<Vec<procurement_record::Model>>
where
    C: ConnectionTrait,
{
    ProcurementRecord::find()
        .filter(procurement_record::Column::Sector.eq(key.sector()))
        .filter(procurement_record::Column::Unit.eq(key.unit()))
        .order_by_desc(procurement_record::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Audit history of record `id`, oldest first.
pub async fn record_history<C>(
    db: &C,
    id: i64,
) -> Result<Vec<crate::entities::audit_entry::Model>>
where
    C: ConnectionTrait,
{
    audit::history(db, ENTITY, id).await
}
