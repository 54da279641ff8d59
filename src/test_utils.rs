//! Shared test utilities for the budget engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        BudgetKey,
        lifecycle::Stage,
        record::NewRecord,
        users::{self, Role},
    },
    entities::{app_user, procurement_record},
    errors::Result,
    money::Money,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The (CTI, PGJ) key used throughout the tests.
#[must_use]
pub fn cti_pgj() -> BudgetKey {
    BudgetKey::new("CTI", "PGJ").expect("static key is valid")
}

/// Registers an active administrator.
pub async fn register_admin<C>(db: &C, user_id: &str) -> Result<app_user::Model>
where
    C: ConnectionTrait,
{
    users::register_user(db, user_id, "Test Admin", Role::Admin, true).await
}

/// Creates a record for (CTI, PGJ) with sensible defaults.
///
/// # Defaults
/// * `contracted_value`: None
/// * `stage`: None (starts in Planning)
#[must_use]
pub fn new_record(description: &str, estimated: Money) -> NewRecord {
    NewRecord {
        description: description.to_string(),
        sector: "CTI".to_string(),
        unit: "PGJ".to_string(),
        estimated_value: estimated,
        contracted_value: None,
        stage: None,
    }
}

/// Writes a record row directly, skipping admission and validation.
/// Use this to set up reservations in any stage.
pub async fn insert_raw_record<C>(
    db: &C,
    sector: &str,
    unit: &str,
    stage: Stage,
    estimated: Money,
    contracted: Option<Money>,
) -> Result<procurement_record::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    procurement_record::ActiveModel {
        description: Set(format!("{stage} record")),
        sector: Set(sector.to_string()),
        unit: Set(unit.to_string()),
        estimated_cents: Set(estimated.cents()),
        contracted_cents: Set(contracted.map(Money::cents)),
        stage: Set(stage.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
