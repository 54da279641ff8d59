//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint entities cannot
//! express, the composite (sector, unit) uniqueness of allocations, is added as an index.

use crate::entities::{
    AppUser, AuditEntry, BudgetAllocation, BudgetSurplus, ProcurementRecord, budget_allocation,
    procurement_record,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

/// Local `SQLite` file used when no database URL is given
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/pca_budget.sqlite?mode=rwc";

/// File path of a `sqlite://` URL, or `None` for in-memory and other backends.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Establishes a connection to the database at `database_url`.
///
/// For `SQLite` files the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!("Connecting to database: {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables (if missing) and the allocation key index.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, BudgetAllocation).await?;
    create_table(db, &schema, BudgetSurplus).await?;
    create_table(db, &schema, ProcurementRecord).await?;
    create_table(db, &schema, AppUser).await?;
    create_table(db, &schema, AuditEntry).await?;

    let allocation_key = Index::create()
        .name("idx_budget_allocations_sector_unit")
        .table(BudgetAllocation)
        .col(budget_allocation::Column::Sector)
        .col(budget_allocation::Column::Unit)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&allocation_key)).await?;

    let record_key = Index::create()
        .name("idx_procurement_records_sector_unit")
        .table(ProcurementRecord)
        .col(procurement_record::Column::Sector)
        .col(procurement_record::Column::Unit)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&record_key)).await?;

    debug!("Schema is up to date");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}
