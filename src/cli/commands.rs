//! Command implementations. Each returns the JSON document to print.

use super::{Cli, Commands};
use crate::{
    config::{
        database,
        settings::{self, Config},
    },
    core::{
        BudgetKey,
        lifecycle::Stage,
        record::{NewRecord, RecordPatch},
        reservation,
    },
    entities::{audit_entry, budget_surplus, procurement_record},
    errors::Result,
    money::Money,
    retry::with_retry,
    service::{BudgetService, Outcome},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info};

/// A record as shown to users: amounts in decimal form plus what it reserves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    id: i64,
    description: String,
    sector: String,
    unit: String,
    stage: Stage,
    estimated_value: Money,
    contracted_value: Option<Money>,
    reserved: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<procurement_record::Model> for RecordView {
    type Error = crate::errors::Error;

    fn try_from(record: procurement_record::Model) -> Result<Self> {
        let reserved = reservation::record_contribution(&record)?;
        Ok(Self {
            id: record.id,
            stage: record.stage.parse()?,
            estimated_value: Money::from_cents(record.estimated_cents),
            contracted_value: record.contracted_cents.map(Money::from_cents),
            reserved,
            description: record.description,
            sector: record.sector,
            unit: record.unit,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// A registered surplus with its amount in decimal form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurplusView {
    id: i64,
    amount: Money,
    justification: String,
    approved_by: String,
    created_at: DateTime<Utc>,
}

impl From<budget_surplus::Model> for SurplusView {
    fn from(surplus: budget_surplus::Model) -> Self {
        Self {
            id: surplus.id,
            amount: Money::from_cents(surplus.additional_cents),
            justification: surplus.justification,
            approved_by: surplus.approved_by,
            created_at: surplus.created_at,
        }
    }
}

/// An audit row with its snapshot decoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    action: String,
    actor: Option<String>,
    snapshot: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<audit_entry::Model> for HistoryView {
    type Error = crate::errors::Error;

    fn try_from(entry: audit_entry::Model) -> Result<Self> {
        Ok(Self {
            snapshot: serde_json::from_str(&entry.snapshot)?,
            action: entry.action,
            actor: entry.actor,
            created_at: entry.created_at,
        })
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

async fn connect(database_url: &str, config: &Config) -> Result<DatabaseConnection> {
    let db = with_retry(&config.retry, "connect", || {
        database::create_connection(database_url)
    })
    .await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Runs the parsed command.
pub async fn execute(cli: &Cli) -> Result<String> {
    let config = settings::load_config_or_default(&cli.config)?;
    let db = connect(&cli.database_url, &config).await?;
    let service = BudgetService::new(db, config.retry.clone());
    debug!(command = ?cli.command, "Executing command");

    match &cli.command {
        Commands::InitDb => {
            info!("Database initialization completed successfully");
            render(&Outcome::success(None))
        }
        Commands::Seed => render(&settings::seed_database(&service, &config).await?),
        Commands::Allocate {
            sector,
            unit,
            amount,
        } => {
            let key = BudgetKey::new(sector, unit)?;
            service.upsert_allocation(&key, *amount).await?;
            render(&Outcome::success(None))
        }
        Commands::Surplus {
            sector,
            unit,
            amount,
            justification,
            approved_by,
        } => {
            let key = BudgetKey::new(sector, unit)?;
            service
                .add_surplus(&key, *amount, justification, approved_by)
                .await?;
            render(&Outcome::success(None))
        }
        Commands::Insert {
            description,
            sector,
            unit,
            estimated,
            contracted,
            stage,
        } => {
            let new = NewRecord {
                description: description.clone(),
                sector: sector.clone(),
                unit: unit.clone(),
                estimated_value: *estimated,
                contracted_value: *contracted,
                stage: *stage,
            };
            let record = service.insert_record(&new).await?;
            render(&Outcome::success(Some(record.id)))
        }
        Commands::Update {
            id,
            stage,
            estimated,
            contracted,
        } => {
            let patch = RecordPatch {
                stage: *stage,
                estimated_value: *estimated,
                contracted_value: *contracted,
            };
            let record = service.update_record(*id, &patch).await?;
            render(&Outcome::success(Some(record.id)))
        }
        Commands::Cancel { id } => {
            let record = service.cancel_record(*id).await?;
            render(&Outcome::success(Some(record.id)))
        }
        Commands::Capacity { sector, unit } => {
            let key = BudgetKey::new(sector, unit)?;
            render(&service.unit_overview(&key).await?)
        }
        Commands::Surpluses { sector, unit } => {
            let key = BudgetKey::new(sector, unit)?;
            let surpluses: Vec<SurplusView> = service
                .list_surpluses(&key)
                .await?
                .into_iter()
                .map(SurplusView::from)
                .collect();
            render(&surpluses)
        }
        Commands::Overview { sector } => render(&service.sector_overview(sector).await?),
        Commands::Records { sector, unit } => {
            let key = BudgetKey::new(sector, unit)?;
            let records = service
                .list_records(&key)
                .await?
                .into_iter()
                .map(RecordView::try_from)
                .collect::<Result<Vec<_>>>()?;
            render(&records)
        }
        Commands::History { id } => {
            service.get_record(*id).await?;
            let history = service
                .record_history(*id)
                .await?
                .into_iter()
                .map(HistoryView::try_from)
                .collect::<Result<Vec<_>>>()?;
            render(&history)
        }
        Commands::AddUser {
            user_id,
            name,
            role,
            inactive,
        } => {
            let user = service
                .register_user(user_id, name, *role, !inactive)
                .await?;
            render(&Outcome::success(Some(user.id)))
        }
    }
}
