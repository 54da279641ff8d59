//! Entity module - Contains all SeaORM entity definitions for the database.
//! Allocations, surpluses and procurement records share the (sector, unit)
//! composite key instead of foreign keys.

pub mod app_user;
pub mod audit_entry;
pub mod budget_allocation;
pub mod budget_surplus;
pub mod procurement_record;

// Re-export specific types to avoid conflicts
pub use app_user::{Column as AppUserColumn, Entity as AppUser, Model as AppUserModel};
pub use audit_entry::{Column as AuditEntryColumn, Entity as AuditEntry, Model as AuditEntryModel};
pub use budget_allocation::{
    Column as BudgetAllocationColumn, Entity as BudgetAllocation, Model as BudgetAllocationModel,
};
pub use budget_surplus::{
    Column as BudgetSurplusColumn, Entity as BudgetSurplus, Model as BudgetSurplusModel,
};
pub use procurement_record::{
    Column as ProcurementRecordColumn, Entity as ProcurementRecord,
    Model as ProcurementRecordModel,
};
