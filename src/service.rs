//! Budget service - the entry point for every budget operation.
//!
//! Writes that touch a (sector, unit) pair take that pair's lock, open a
//! transaction, run the core function against it and commit. The admission
//! check and the write therefore see one consistent view, and two concurrent
//! writers on the same pair are decided one after the other. Reads go straight
//! to the connection. Everything runs under [`with_retry`].

use crate::{
    core::{
        BudgetKey, ledger,
        overview::{self, SectorOverview, UnitOverview},
        record::{self, NewRecord, RecordPatch},
        users::{self, Role},
    },
    entities::{app_user, audit_entry, budget_allocation, budget_surplus, procurement_record},
    errors::{Error, Result},
    locks::KeyedLocks,
    money::Money,
    retry::{RetryConfig, with_retry},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::instrument;

/// Result document of a write: `{ "ok": true, "id": 7 }` or
/// `{ "ok": false, "error": "BudgetExceeded", "message": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether the operation was applied
    pub ok: bool,
    /// Id of the created or updated row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Error code on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    /// Human-readable error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// Successful outcome, with the affected id when there is one.
    #[must_use]
    pub const fn success(id: Option<i64>) -> Self {
        Self {
            ok: true,
            id,
            error: None,
            message: None,
        }
    }

    /// Failed outcome carrying the error code and message.
    #[must_use]
    pub fn failure(error: &Error) -> Self {
        Self {
            ok: false,
            id: None,
            error: Some(error.code()),
            message: Some(error.to_string()),
        }
    }
}

/// Serializes budget writes per (sector, unit) pair on top of a database connection.
#[derive(Debug)]
pub struct BudgetService {
    db: DatabaseConnection,
    locks: KeyedLocks<BudgetKey>,
    retry: RetryConfig,
}

impl BudgetService {
    /// Creates a service over `db`.
    #[must_use]
    pub fn new(db: DatabaseConnection, retry: RetryConfig) -> Self {
        Self {
            db,
            locks: KeyedLocks::new(),
            retry,
        }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates or replaces the approved allocation of a pair.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn upsert_allocation(
        &self,
        key: &BudgetKey,
        approved: Money,
    ) -> Result<budget_allocation::Model> {
        let _guard = self.locks.lock(key).await;
        with_retry(&self.retry, "upsert_allocation", || async {
            let txn = self.db.begin().await?;
            let allocation = ledger::upsert_allocation(&txn, key, approved).await?;
            txn.commit().await?;
            Ok(allocation)
        })
        .await
    }

    /// Appends a surplus approved by `approved_by`.
    #[instrument(skip(self, justification), fields(key = %key))]
    pub async fn add_surplus(
        &self,
        key: &BudgetKey,
        additional: Money,
        justification: &str,
        approved_by: &str,
    ) -> Result<budget_surplus::Model> {
        let _guard = self.locks.lock(key).await;
        with_retry(&self.retry, "add_surplus", || async {
            let txn = self.db.begin().await?;
            let surplus =
                ledger::add_surplus(&txn, key, additional, justification, approved_by).await?;
            txn.commit().await?;
            Ok(surplus)
        })
        .await
    }

    /// Admits and inserts a record. A rejected insert persists nothing.
    #[instrument(skip(self, new), fields(sector = %new.sector, unit = %new.unit, estimated = %new.estimated_value))]
    pub async fn insert_record(&self, new: &NewRecord) -> Result<procurement_record::Model> {
        let key = new.validate()?;
        let _guard = self.locks.lock(&key).await;
        with_retry(&self.retry, "insert_record", || async {
            let txn = self.db.begin().await?;
            let record = record::insert_record(&txn, new).await?;
            txn.commit().await?;
            Ok(record)
        })
        .await
    }

    /// Applies `patch` to record `id`. A rejected update leaves the record unchanged.
    #[instrument(skip(self))]
    pub async fn update_record(
        &self,
        id: i64,
        patch: &RecordPatch,
    ) -> Result<procurement_record::Model> {
        // The key of a record never changes, so it can be read before locking
        let existing = self.get_record(id).await?;
        let key = BudgetKey::new(&existing.sector, &existing.unit)?;

        let _guard = self.locks.lock(&key).await;
        with_retry(&self.retry, "update_record", || async {
            let txn = self.db.begin().await?;
            let record = record::update_record(&txn, id, patch).await?;
            txn.commit().await?;
            Ok(record)
        })
        .await
    }

    /// Cancels record `id`, releasing its reservation.
    pub async fn cancel_record(&self, id: i64) -> Result<procurement_record::Model> {
        self.update_record(id, &RecordPatch::cancel()).await
    }

    /// Looks a record up, failing with `RecordNotFound` when absent.
    pub async fn get_record(&self, id: i64) -> Result<procurement_record::Model> {
        with_retry(&self.retry, "get_record", || record::get_record(&self.db, id))
            .await?
            .ok_or(Error::RecordNotFound { id })
    }

    /// Records of a pair, newest first.
    pub async fn list_records(&self, key: &BudgetKey) -> Result<Vec<procurement_record::Model>> {
        with_retry(&self.retry, "list_records", || {
            record::list_records(&self.db, key)
        })
        .await
    }

    /// Audit history of record `id`, oldest first.
    pub async fn record_history(&self, id: i64) -> Result<Vec<audit_entry::Model>> {
        with_retry(&self.retry, "record_history", || {
            record::record_history(&self.db, id)
        })
        .await
    }

    /// Budget usage of every unit of `sector`.
    #[instrument(skip(self))]
    pub async fn sector_overview(&self, sector: &str) -> Result<SectorOverview> {
        with_retry(&self.retry, "sector_overview", || {
            overview::sector_overview(&self.db, sector)
        })
        .await
    }

    /// Budget usage of one pair.
    pub async fn unit_overview(&self, key: &BudgetKey) -> Result<UnitOverview> {
        with_retry(&self.retry, "unit_overview", || {
            overview::unit_overview(&self.db, key)
        })
        .await
    }

    /// Surpluses of a pair, oldest first.
    pub async fn list_surpluses(&self, key: &BudgetKey) -> Result<Vec<budget_surplus::Model>> {
        with_retry(&self.retry, "list_surpluses", || {
            ledger::list_surpluses(&self.db, key)
        })
        .await
    }

    /// Effective capacity of a pair.
    pub async fn effective_capacity(&self, key: &BudgetKey) -> Result<Money> {
        with_retry(&self.retry, "effective_capacity", || {
            ledger::effective_capacity(&self.db, key)
        })
        .await
    }

    /// Creates or updates a user of the approver directory.
    #[instrument(skip(self, name))]
    pub async fn register_user(
        &self,
        user_id: &str,
        name: &str,
        role: Role,
        is_active: bool,
    ) -> Result<app_user::Model> {
        with_retry(&self.retry, "register_user", || {
            users::register_user(&self.db, user_id, name, role, is_active)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::{
        core::{lifecycle::Stage, reservation},
        test_utils::{cti_pgj, new_record, register_admin, setup_test_db},
    };

    async fn service_with_capacity(capacity: Money) -> Result<BudgetService> {
        let db = setup_test_db().await?;
        register_admin(&db, "admin").await?;
        let service = BudgetService::new(db, RetryConfig::none());
        service.upsert_allocation(&cti_pgj(), capacity).await?;
        Ok(service)
    }

    fn stage(stage: Stage) -> RecordPatch {
        RecordPatch {
            stage: Some(stage),
            ..RecordPatch::default()
        }
    }

    #[tokio::test]
    async fn test_capacity_scenario() -> Result<()> {
        let units = Money::from_units;
        let key = cti_pgj();
        let service = service_with_capacity(units(100_000)).await?;

        let a = service
            .insert_record(&new_record("A", units(60_000)))
            .await?;

        let b = service.insert_record(&new_record("B", units(50_000))).await;
        match b {
            Err(Error::BudgetExceeded {
                reserved,
                requested,
                capacity,
                ..
            }) => {
                assert_eq!(reserved, units(60_000));
                assert_eq!(requested, units(50_000));
                assert_eq!(capacity, units(100_000));
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }

        let contract = RecordPatch {
            stage: Some(Stage::Contracted),
            contracted_value: Some(units(60_000)),
            ..RecordPatch::default()
        };
        service.update_record(a.id, &contract).await?;
        service.cancel_record(a.id).await?;
        assert_eq!(
            reservation::reserved_amount(service.db(), &key, None).await?,
            Money::ZERO
        );

        service
            .insert_record(&new_record("C", units(50_000)))
            .await?;
        let d = service.insert_record(&new_record("D", units(70_000))).await;
        assert!(matches!(d, Err(Error::BudgetExceeded { .. })));

        service
            .add_surplus(&key, units(30_000), "Mid-year revision", "admin")
            .await?;
        assert_eq!(service.effective_capacity(&key).await?, units(130_000));
        let surpluses = service.list_surpluses(&key).await?;
        assert_eq!(surpluses.len(), 1);
        assert_eq!(surpluses[0].additional_cents, units(30_000).cents());

        service
            .insert_record(&new_record("E", units(70_000)))
            .await?;

        let overview = service.unit_overview(&key).await?;
        assert_eq!(overview.reserved_amount, units(120_000));
        assert_eq!(overview.available, units(10_000));

        // Only the admitted records exist
        let descriptions: Vec<String> = service
            .list_records(&key)
            .await?
            .into_iter()
            .map(|r| r.description)
            .collect();
        assert_eq!(descriptions, ["E", "C", "A"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_changes_follow_contract_value() -> Result<()> {
        let units = Money::from_units;
        let key = cti_pgj();
        let service = service_with_capacity(units(100)).await?;
        let record = service.insert_record(&new_record("A", units(80))).await?;

        // Contracting below the estimate frees capacity
        let contract = RecordPatch {
            stage: Some(Stage::Contracted),
            contracted_value: Some(units(50)),
            ..RecordPatch::default()
        };
        service.update_record(record.id, &contract).await?;
        assert_eq!(
            reservation::reserved_amount(service.db(), &key, None).await?,
            units(50)
        );
        service.insert_record(&new_record("B", units(50))).await?;

        // Raising the contracted value now has to fit next to B
        let raise = RecordPatch {
            contracted_value: Some(units(51)),
            ..RecordPatch::default()
        };
        let result = service.update_record(record.id, &raise).await;
        assert!(matches!(result, Err(Error::BudgetExceeded { .. })));

        service.update_record(record.id, &stage(Stage::Completed)).await?;
        let result = service.cancel_record(record.id).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthorized_surplus_changes_nothing() -> Result<()> {
        let key = cti_pgj();
        let service = service_with_capacity(Money::from_units(100)).await?;
        service
            .register_user("clerk", "Clerk", Role::Staff, true)
            .await?;
        service
            .register_user("former", "Former Admin", Role::Admin, false)
            .await?;

        for user in ["clerk", "former", "nobody"] {
            let result = service
                .add_surplus(&key, Money::from_units(10), "Extra", user)
                .await;
            assert!(matches!(result, Err(Error::Unauthorized { .. })));
        }
        assert_eq!(
            service.effective_capacity(&key).await?,
            Money::from_units(100)
        );
        assert!(service.list_surpluses(&key).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_inserts_on_one_pair() -> Result<()> {
        let service = service_with_capacity(Money::from_units(100)).await?;
        let first = new_record("First", Money::from_units(60));
        let second = new_record("Second", Money::from_units(60));

        let (a, b) = tokio::join!(service.insert_record(&first), service.insert_record(&second));

        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
        let rejected = if a.is_err() { a } else { b };
        assert!(matches!(rejected, Err(Error::BudgetExceeded { .. })));
        assert_eq!(service.list_records(&cti_pgj()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_inserts_on_shared_service() -> Result<()> {
        let service = std::sync::Arc::new(service_with_capacity(Money::from_units(100)).await?);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = std::sync::Arc::clone(&service);
                tokio::spawn(async move {
                    let record = new_record(&format!("R{i}"), Money::from_units(30));
                    service.insert_record(&record).await
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
        let overview = service.unit_overview(&cti_pgj()).await?;
        assert_eq!(overview.reserved_amount, Money::from_units(90));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_record() -> Result<()> {
        let service = service_with_capacity(Money::from_units(100)).await?;
        let result = service.cancel_record(99).await;
        assert!(matches!(result, Err(Error::RecordNotFound { id: 99 })));
        Ok(())
    }

    #[test]
    fn test_outcome_json_shape() {
        let created = Outcome::success(Some(7));
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            serde_json::json!({ "ok": true, "id": 7 })
        );

        let done = Outcome::success(None);
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            serde_json::json!({ "ok": true })
        );

        let err = Error::InvalidAmount {
            amount: Money::ZERO,
        };
        let failed = Outcome::failure(&err);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "InvalidAmount");
        assert!(json["message"].as_str().unwrap().contains("0.00"));
        assert!(json.get("id").is_none());
    }
}
