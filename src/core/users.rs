//! Approver directory.
//!
//! Surplus approvals must come from an active administrator. Users are
//! registered (or re-registered) by `user_id`, normally from the seed file.

use crate::{
    entities::{AppUser, app_user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::info;

/// Role of an application user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May approve budget surpluses
    Admin,
    /// Regular planning staff
    Staff,
}

impl Role {
    /// Name stored in the `role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Self::Admin),
            "staff" | "user" => Ok(Self::Staff),
            other => Err(Error::InvalidInput {
                message: format!("unknown role '{other}'"),
            }),
        }
    }
}

/// Creates a user or updates the name, role and active flag of an existing one.
pub async fn register_user<C>(
    db: &C,
    user_id: &str,
    name: &str,
    role: Role,
    is_active: bool,
) -> Result<app_user::Model>
where
    C: ConnectionTrait,
{
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::InvalidInput {
            message: "user id cannot be empty".to_string(),
        });
    }

    let user = match get_user(db, user_id).await? {
        Some(existing) => {
            let mut active: app_user::ActiveModel = existing.into();
            active.name = Set(name.trim().to_string());
            active.role = Set(role.as_str().to_string());
            active.is_active = Set(is_active);
            active.update(db).await?
        }
        None => {
            app_user::ActiveModel {
                user_id: Set(user_id.to_string()),
                name: Set(name.trim().to_string()),
                role: Set(role.as_str().to_string()),
                is_active: Set(is_active),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    info!(user_id = %user.user_id, role = %user.role, "Registered user");
    Ok(user)
}

/// Looks a user up by external id.
pub async fn get_user<C>(db: &C, user_id: &str) -> Result<Option<app_user::Model>>
where
    C: ConnectionTrait,
{
    AppUser::find()
        .filter(app_user::Column::UserId.eq(user_id.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether `user_id` resolves to an active administrator.
pub async fn is_approver<C>(db: &C, user_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(get_user(db, user_id)
        .await?
        .is_some_and(|user| user.is_active && user.role == Role::Admin.as_str()))
}

/// Fails with `Unauthorized` unless `user_id` is an active administrator.
pub async fn ensure_approver<C>(db: &C, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    if is_approver(db, user_id).await? {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            user_id: user_id.to_string(),
        })
    }
}
