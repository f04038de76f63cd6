//! Persistence collaborator.
//!
//! Plain reads and single-statement writes live on [`Store`]. Anything that
//! touches more than one table goes through a [`UnitOfWork`] obtained from
//! [`Store::begin`]; it must be committed explicitly and rolls back when
//! dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    asset::{Asset, AssetPatch, NewAsset},
    asset_request::{AssetRequest, NewAssetRequest, RequestStatus},
    company::NewCompanyMember,
    ledger::{LedgerEntry, NewLedgerEntry, TypeCount},
    role::Role,
    user::{EmploymentStatus, Employment, NewUser, User},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("unexpected value {value:?} in column {column}")]
    Decode { column: &'static str, value: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>>;

    async fn find_user(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts the user unless the email is already registered; returns the
    /// stored record either way.
    async fn insert_user_if_absent(&self, user: &NewUser) -> StoreResult<User>;

    async fn set_package(&self, email: &str, package_name: &str) -> StoreResult<bool>;

    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>>;

    async fn insert_asset(&self, asset: &NewAsset) -> StoreResult<Asset>;

    /// Applies `patch` when the asset is held by `holder_email`.
    async fn update_asset(&self, id: u64, holder_email: &str, patch: &AssetPatch)
    -> StoreResult<bool>;

    /// Deletes the asset unless a `Requested` or `Approved` request still
    /// points at it.
    async fn delete_unused_asset(&self, id: u64, holder_email: &str) -> StoreResult<bool>;

    async fn count_assets(&self, holder_email: &str) -> StoreResult<i64>;

    async fn find_request(&self, id: u64) -> StoreResult<Option<AssetRequest>>;

    async fn count_requests(&self, holder_email: &str, status: RequestStatus) -> StoreResult<i64>;

    /// Open requests (any status) made by one employee.
    async fn count_requests_by(&self, requester_email: &str) -> StoreResult<i64>;

    /// Ledger entries of one requester for a calendar month, newest first.
    async fn ledger_for_month(
        &self,
        requester_email: &str,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<LedgerEntry>>;

    /// Ledger entries of one holder grouped by asset type.
    async fn ledger_type_counts(&self, holder_email: &str) -> StoreResult<Vec<TypeCount>>;

    async fn count_members(&self, hr_email: &str) -> StoreResult<i64>;

    async fn close(&self);
}

/// Writes staged inside one transaction. Rows read through `lock_*` stay
/// locked until commit or rollback.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn lock_asset(&mut self, id: u64) -> StoreResult<Option<Asset>>;

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<AssetRequest>>;

    async fn lock_user(&mut self, email: &str) -> StoreResult<Option<User>>;

    /// Adds the deltas to quantity and pending count. Returns `false` without
    /// writing when either column would go negative.
    async fn adjust_asset(&mut self, id: u64, quantity: i32, pending: i32) -> StoreResult<bool>;

    async fn insert_request(&mut self, request: &NewAssetRequest) -> StoreResult<u64>;

    /// Moves the request from `from` to `to`; `false` when it was not in `from`.
    async fn transition_request(
        &mut self,
        id: u64,
        from: RequestStatus,
        to: RequestStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool>;

    async fn delete_request(&mut self, id: u64) -> StoreResult<bool>;

    async fn append_ledger(&mut self, entry: &NewLedgerEntry) -> StoreResult<u64>;

    /// Sets role and status; `employment` of `None` clears the company fields.
    async fn set_employment(
        &mut self,
        email: &str,
        role: Role,
        status: EmploymentStatus,
        employment: Option<&Employment>,
    ) -> StoreResult<bool>;

    /// Same guard as [`UnitOfWork::adjust_asset`] for the HR team counter.
    async fn adjust_team_count(&mut self, hr_email: &str, delta: i32) -> StoreResult<bool>;

    async fn insert_member(&mut self, member: &NewCompanyMember) -> StoreResult<u64>;

    async fn delete_member(&mut self, hr_email: &str, employee_email: &str) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Adds a signed delta to an unsigned counter, refusing to go below zero.
pub(crate) fn apply_delta(value: u32, delta: i32) -> Option<u32> {
    value.checked_add_signed(delta)
}
