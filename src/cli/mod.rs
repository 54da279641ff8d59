//! Command-line surface.
//!
//! Every command prints one JSON document on stdout. Logs go to stderr.
//! Business rejections exit with status 1, store and configuration failures
//! with status 2.

use crate::{
    config::{database, settings::DEFAULT_CONFIG_PATH},
    core::{lifecycle::Stage, users::Role},
    errors::Error,
    money::Money,
    service::Outcome,
};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use tracing::error;

pub mod commands;

/// Budget reservation engine for the annual procurement plan
#[derive(Debug, Parser)]
#[command(name = "pca-budget")]
#[command(version)]
pub struct Cli {
    /// Database URL
    ///
    /// Examples:
    ///   `SQLite` file: sqlite://data/pca_budget.sqlite?mode=rwc
    ///   In memory:   sqlite::memory:
    #[arg(short, long, global = true, env = "DATABASE_URL", default_value = database::DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Path to config.toml (retry tuning, seed users and allocations)
    #[arg(short, long, global = true, env = "PCA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the tables if they do not exist
    InitDb,
    /// Register the users and allocations listed in the configuration file
    Seed,
    /// Create or replace the approved allocation of a (sector, unit) pair
    Allocate {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
        /// Approved amount, e.g. 100000.00
        #[arg(allow_negative_numbers = true)]
        amount: Money,
    },
    /// Register a budget surplus for a (sector, unit) pair
    Surplus {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
        /// Additional amount
        #[arg(allow_negative_numbers = true)]
        amount: Money,
        /// Why the surplus was granted
        #[arg(short, long)]
        justification: String,
        /// Identity of the approving administrator
        #[arg(short, long)]
        approved_by: String,
    },
    /// Insert a procurement record, reserving its value
    Insert {
        /// What is being procured
        #[arg(long)]
        description: String,
        /// Requesting sector
        #[arg(long)]
        sector: String,
        /// Budgetary unit
        #[arg(long)]
        unit: String,
        /// Estimated value
        #[arg(long, allow_negative_numbers = true)]
        estimated: Money,
        /// Contracted value, if already known
        #[arg(long, allow_negative_numbers = true)]
        contracted: Option<Money>,
        /// Initial stage (planning or in_bidding)
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// Change the stage or values of a record
    Update {
        /// Record id
        id: i64,
        /// New stage
        #[arg(long)]
        stage: Option<Stage>,
        /// New estimated value
        #[arg(long, allow_negative_numbers = true)]
        estimated: Option<Money>,
        /// New contracted value
        #[arg(long, allow_negative_numbers = true)]
        contracted: Option<Money>,
    },
    /// Cancel a record, releasing its reservation
    Cancel {
        /// Record id
        id: i64,
    },
    /// Show approved, surplus, reserved and available amounts of a pair
    Capacity {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
    },
    /// List the surpluses of a pair, oldest first
    Surpluses {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
    },
    /// Show budget usage of every unit of a sector
    Overview {
        /// Requesting sector
        sector: String,
    },
    /// List the records of a pair, newest first
    Records {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
    },
    /// Show the audit history of a record
    History {
        /// Record id
        id: i64,
    },
    /// Create or update a user of the approver directory
    AddUser {
        /// External identity
        user_id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// admin or staff
        #[arg(long, default_value = "staff")]
        role: Role,
        /// Register the user as inactive
        #[arg(long)]
        inactive: bool,
    },
}

impl Cli {
    /// Runs the command and prints its JSON result.
    pub async fn run(self) -> ExitCode {
        match commands::execute(&self).await {
            Ok(document) => {
                println!("{document}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}", failure_document(&e));
                if e.is_rejection() {
                    ExitCode::from(1)
                } else {
                    error!("Command failed: {e}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn failure_document(e: &Error) -> String {
    serde_json::to_string_pretty(&Outcome::failure(e))
        .unwrap_or_else(|_| format!(r#"{{"ok":false,"error":"{}"}}"#, e.code()))
}
