//! Application configuration loading from config.toml
//!
//! The file is optional. It tunes store retries and lists the approvers and
//! approved allocations used to seed a fresh database.

use crate::{
    core::{BudgetKey, users::Role},
    errors::{Error, Result},
    money::Money,
    retry::RetryConfig,
    service::BudgetService,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store retry tuning
    pub retry: RetryConfig,
    /// Users of the approver directory
    pub users: Vec<UserConfig>,
    /// Approved allocations per (sector, unit)
    pub allocations: Vec<AllocationConfig>,
}

/// A user to register when seeding
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// External identity
    pub user_id: String,
    /// Display name
    pub name: String,
    /// `admin` or `staff`
    pub role: Role,
    /// Inactive users cannot approve surpluses
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// An approved allocation to upsert when seeding
#[derive(Debug, Deserialize, Clone)]
pub struct AllocationConfig {
    /// Requesting sector
    pub sector: String,
    /// Budgetary unit
    pub unit: String,
    /// Decimal amount as a string, e.g. `"100000.00"`
    pub approved_amount: Money,
}

/// Counts of what [`seed_database`] applied
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// Users registered or updated
    pub users: usize,
    /// Allocations upserted
    pub allocations: usize,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or an amount does not parse
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read config file {}: {e}",
            path.as_ref().display()
        ),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `path` when it exists, otherwise returns the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        info!(
            "No configuration at {}, using defaults",
            path.as_ref().display()
        );
        Ok(Config::default())
    }
}

/// Registers the configured users, then upserts the configured allocations.
/// Running it twice leaves the same state.
pub async fn seed_database(service: &BudgetService, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for user in &config.users {
        service
            .register_user(&user.user_id, &user.name, user.role, user.is_active)
            .await?;
        summary.users += 1;
    }

    for allocation in &config.allocations {
        let key = BudgetKey::new(&allocation.sector, &allocation.unit)?;
        service
            .upsert_allocation(&key, allocation.approved_amount)
            .await?;
        summary.allocations += 1;
    }

    info!(
        users = summary.users,
        allocations = summary.allocations,
        "Database seeded from configuration"
    );
    Ok(summary)
}
