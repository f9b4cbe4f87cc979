//! Persistence ports for the ledger, the template catalog and the entitlement ledger.
//!
//! Workflows never hold a global handle: each call receives the store it works
//! against. `PgStore` is the production backend; `MemoryStore` is the embedded
//! backend the test suite runs the workflows against.
//!
//! Every balance mutation goes through a `LedgerTx`, which is the atomic unit.
//! Dropping a `LedgerTx` without calling `commit` rolls it back and releases
//! every row lock it holds.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::models::template::{NewTemplate, Template, TemplateFilter, TemplatePatch};
use crate::models::user::{ProfileUpdate, User};
use crate::models::wallet::{ChargeFilter, ChargeStatus, WalletCharge};

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    /// A unique key already holds this value.
    #[error("Duplicate: {0}")]
    Duplicate(String),
}

/// skip/limit pagination, as accepted on every listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Returns an error message when the bounds are outside `skip >= 0`, `1 <= limit <= 1000`.
    pub fn check(&self) -> Result<(), String> {
        if self.skip < 0 {
            return Err("skip must be >= 0".to_string());
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        Ok(())
    }
}

/// Users and their wallet charges.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    async fn create_charge(
        &self,
        user_id: i64,
        amount: Decimal,
        receipt_ref: &str,
    ) -> Result<WalletCharge, StoreError>;

    async fn get_charge(&self, charge_id: i64) -> Result<Option<WalletCharge>, StoreError>;

    /// Newest first by id.
    async fn list_charges(
        &self,
        filter: &ChargeFilter,
        page: Page,
    ) -> Result<Vec<WalletCharge>, StoreError>;

    /// Opens an atomic unit spanning balances, charge statuses and entitlements.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;
}

/// One atomic unit. Row locks taken here are held until commit or drop.
///
/// Lock order is charge row before user row.
#[async_trait]
pub trait LedgerTx: Send {
    /// Exclusive lock on the charge row; blocks until granted.
    async fn lock_charge_for_update(
        &mut self,
        charge_id: i64,
    ) -> Result<Option<WalletCharge>, StoreError>;

    /// Exclusive lock on the user row; blocks until granted.
    async fn lock_user_for_update(&mut self, user_id: i64) -> Result<Option<User>, StoreError>;

    /// Requires the user row to be locked in this unit.
    async fn adjust_balance(&mut self, user_id: i64, delta: Decimal) -> Result<(), StoreError>;

    /// Requires the charge row to be locked in this unit.
    async fn set_charge_status(
        &mut self,
        charge_id: i64,
        status: ChargeStatus,
    ) -> Result<(), StoreError>;

    async fn entitlement_exists(&mut self, user_id: i64, template_id: i64)
        -> Result<bool, StoreError>;

    /// Requires the user row to be locked in this unit.
    async fn grant_entitlement(&mut self, user_id: i64, template_id: i64)
        -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    async fn get_template(&self, template_id: i64) -> Result<Option<Template>, StoreError>;

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, StoreError>;

    /// Ordered by `sort_order`, then `name`.
    async fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: Page,
    ) -> Result<Vec<Template>, StoreError>;

    async fn create_template(&self, template: &NewTemplate) -> Result<Template, StoreError>;

    async fn update_template(
        &self,
        template_id: i64,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, StoreError>;

    /// Returns false when no such row existed. Entitlements on the row go with it.
    async fn delete_template(&self, template_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait EntitlementLedger: Send + Sync {
    async fn exists(&self, user_id: i64, template_id: i64) -> Result<bool, StoreError>;

    /// Template ids of the user's entitlements, newest grant first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<i64>, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the existing row when the phone number is already registered.
    async fn register(&self, phone_number: &str) -> Result<User, StoreError>;

    async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
}
