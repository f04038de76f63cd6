use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::{
    model::{
        asset::{Asset, AssetPatch, NewAsset},
        asset_request::{AssetRequest, NewAssetRequest, RequestStatus},
        company::NewCompanyMember,
        ledger::{LedgerEntry, NewLedgerEntry, TypeCount},
        role::Role,
        user::{EmploymentStatus, Employment, NewUser, User},
    },
    utils::db_utils::{SqlValue, build_update_sql, execute_update},
};

const USER_COLUMNS: &str = "id, email, name, photo_url, role, status, hr_email, company_name, \
     company_logo_url, team_member_count, package_name, created_at";
const ASSET_COLUMNS: &str = "id, name, asset_type, quantity, pending_count, holder_email, created_at";
const REQUEST_COLUMNS: &str = "id, asset_id, asset_name, asset_type, requester_email, \
     requester_name, holder_email, note, status, requested_at, approved_at";
const LEDGER_COLUMNS: &str = "id, request_id, asset_id, asset_name, asset_type, requester_email, \
     holder_email, note, requested_at, month, year";

fn parse<T: FromStr>(column: &'static str, value: String) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::Decode { column, value })
}

// Enum columns are plain VARCHARs; rows are read as strings and parsed here.

#[derive(FromRow)]
struct UserRow {
    id: u64,
    email: String,
    name: String,
    photo_url: Option<String>,
    role: String,
    status: String,
    hr_email: Option<String>,
    company_name: Option<String>,
    company_logo_url: Option<String>,
    team_member_count: u32,
    package_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            photo_url: row.photo_url,
            role: parse("role", row.role)?,
            status: parse("status", row.status)?,
            hr_email: row.hr_email,
            company_name: row.company_name,
            company_logo_url: row.company_logo_url,
            team_member_count: row.team_member_count,
            package_name: row.package_name,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AssetRow {
    id: u64,
    name: String,
    asset_type: String,
    quantity: u32,
    pending_count: u32,
    holder_email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> StoreResult<Self> {
        Ok(Asset {
            id: row.id,
            name: row.name,
            asset_type: parse("asset_type", row.asset_type)?,
            quantity: row.quantity,
            pending_count: row.pending_count,
            holder_email: row.holder_email,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    asset_id: u64,
    asset_name: String,
    asset_type: String,
    requester_email: String,
    requester_name: String,
    holder_email: String,
    note: Option<String>,
    status: String,
    requested_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for AssetRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> StoreResult<Self> {
        Ok(AssetRequest {
            id: row.id,
            asset_id: row.asset_id,
            asset_name: row.asset_name,
            asset_type: parse("asset_type", row.asset_type)?,
            requester_email: row.requester_email,
            requester_name: row.requester_name,
            holder_email: row.holder_email,
            note: row.note,
            status: parse("status", row.status)?,
            requested_at: row.requested_at,
            approved_at: row.approved_at,
        })
    }
}

#[derive(FromRow)]
struct LedgerRow {
    id: u64,
    request_id: u64,
    asset_id: u64,
    asset_name: String,
    asset_type: String,
    requester_email: String,
    holder_email: String,
    note: Option<String>,
    requested_at: DateTime<Utc>,
    month: u32,
    year: i32,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: LedgerRow) -> StoreResult<Self> {
        Ok(LedgerEntry {
            id: row.id,
            request_id: row.request_id,
            asset_id: row.asset_id,
            asset_name: row.asset_name,
            asset_type: parse("asset_type", row.asset_type)?,
            requester_email: row.requester_email,
            holder_email: row.holder_email,
            note: row.note,
            requested_at: row.requested_at,
            month: row.month,
            year: row.year,
        })
    }
}

fn patch_assignments(patch: &AssetPatch) -> Vec<(&'static str, SqlValue)> {
    let mut assignments = Vec::new();
    if let Some(name) = &patch.name {
        assignments.push(("name", SqlValue::String(name.clone())));
    }
    if let Some(asset_type) = patch.asset_type {
        assignments.push(("asset_type", SqlValue::String(asset_type.as_ref().to_string())));
    }
    if let Some(quantity) = patch.quantity {
        assignments.push(("quantity", SqlValue::U32(quantity)));
    }
    assignments
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlUnitOfWork { tx }))
    }

    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn insert_user_if_absent(&self, user: &NewUser) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT IGNORE INTO users
                (email, name, photo_url, role, status, company_name, company_logo_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.photo_url)
        .bind(user.role.as_ref())
        .bind(EmploymentStatus::Available.as_ref())
        .bind(&user.company_name)
        .bind(&user.company_logo_url)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        self.find_user(&user.email)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn set_package(&self, email: &str, package_name: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET package_name = ? WHERE email = ?")
            .bind(package_name)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>> {
        sqlx::query_as::<_, AssetRow>(&format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Asset::try_from)
            .transpose()
    }

    async fn insert_asset(&self, asset: &NewAsset) -> StoreResult<Asset> {
        let result = sqlx::query(
            r#"
            INSERT INTO assets (name, asset_type, quantity, pending_count, holder_email, created_at)
            VALUES (?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&asset.name)
        .bind(asset.asset_type.as_ref())
        .bind(asset.quantity)
        .bind(&asset.holder_email)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(asset.clone().into_asset(result.last_insert_id()))
    }

    async fn update_asset(
        &self,
        id: u64,
        holder_email: &str,
        patch: &AssetPatch,
    ) -> StoreResult<bool> {
        let Some(update) = build_update_sql(
            "assets",
            patch_assignments(patch),
            vec![
                ("id", SqlValue::U64(id)),
                ("holder_email", SqlValue::String(holder_email.to_string())),
            ],
        ) else {
            return Ok(false);
        };

        let affected = execute_update(&self.pool, update).await?;
        Ok(affected > 0)
    }

    async fn delete_unused_asset(&self, id: u64, holder_email: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM assets
            WHERE id = ? AND holder_email = ?
              AND NOT EXISTS (
                  SELECT 1 FROM asset_requests
                  WHERE asset_id = ? AND status IN ('Requested', 'Approved')
              )
            "#,
        )
        .bind(id)
        .bind(holder_email)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_assets(&self, holder_email: &str) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assets WHERE holder_email = ?")
            .bind(holder_email)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_request(&self, id: u64) -> StoreResult<Option<AssetRequest>> {
        sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM asset_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(AssetRequest::try_from)
        .transpose()
    }

    async fn count_requests(&self, holder_email: &str, status: RequestStatus) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM asset_requests WHERE holder_email = ? AND status = ?",
        )
        .bind(holder_email)
        .bind(status.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn count_requests_by(&self, requester_email: &str) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM asset_requests WHERE requester_email = ?",
        )
        .bind(requester_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn ledger_for_month(
        &self,
        requester_email: &str,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<LedgerEntry>> {
        sqlx::query_as::<_, LedgerRow>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS}
            FROM monthly_ledger
            WHERE requester_email = ? AND month = ? AND year = ?
            ORDER BY requested_at DESC, id DESC
            "#
        ))
        .bind(requester_email)
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LedgerEntry::try_from)
        .collect()
    }

    async fn ledger_type_counts(&self, holder_email: &str) -> StoreResult<Vec<TypeCount>> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT asset_type, COUNT(*) AS count
            FROM monthly_ledger
            WHERE holder_email = ?
            GROUP BY asset_type
            ORDER BY asset_type
            "#,
        )
        .bind(holder_email)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(asset_type, count)| {
            Ok(TypeCount {
                asset_type: parse("asset_type", asset_type)?,
                count,
            })
        })
        .collect()
    }

    async fn count_members(&self, hr_email: &str) -> StoreResult<i64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM company_members WHERE hr_email = ?")
                .bind(hr_email)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct MySqlUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
    async fn lock_asset(&mut self, id: u64) -> StoreResult<Option<Asset>> {
        sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(Asset::try_from)
        .transpose()
    }

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<AssetRequest>> {
        sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM asset_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(AssetRequest::try_from)
        .transpose()
    }

    async fn lock_user(&mut self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? FOR UPDATE"
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn adjust_asset(&mut self, id: u64, quantity: i32, pending: i32) -> StoreResult<bool> {
        // Unsigned columns are widened before adding a negative delta.
        let result = sqlx::query(
            r#"
            UPDATE assets
            SET quantity = CAST(quantity AS SIGNED) + ?,
                pending_count = CAST(pending_count AS SIGNED) + ?
            WHERE id = ?
              AND CAST(quantity AS SIGNED) + ? >= 0
              AND CAST(pending_count AS SIGNED) + ? >= 0
            "#,
        )
        .bind(quantity)
        .bind(pending)
        .bind(id)
        .bind(quantity)
        .bind(pending)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(&mut self, request: &NewAssetRequest) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO asset_requests
                (asset_id, asset_name, asset_type, requester_email, requester_name,
                 holder_email, note, status, requested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.asset_id)
        .bind(&request.asset_name)
        .bind(request.asset_type.as_ref())
        .bind(&request.requester_email)
        .bind(&request.requester_name)
        .bind(&request.holder_email)
        .bind(&request.note)
        .bind(RequestStatus::Requested.as_ref())
        .bind(request.requested_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn transition_request(
        &mut self,
        id: u64,
        from: RequestStatus,
        to: RequestStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE asset_requests
            SET status = ?, approved_at = COALESCE(?, approved_at)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_ref())
        .bind(approved_at)
        .bind(id)
        .bind(from.as_ref())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_request(&mut self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM asset_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_ledger(&mut self, entry: &NewLedgerEntry) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO monthly_ledger
                (request_id, asset_id, asset_name, asset_type, requester_email,
                 holder_email, note, requested_at, month, year)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.request_id)
        .bind(entry.asset_id)
        .bind(&entry.asset_name)
        .bind(entry.asset_type.as_ref())
        .bind(&entry.requester_email)
        .bind(&entry.holder_email)
        .bind(&entry.note)
        .bind(entry.requested_at)
        .bind(entry.month)
        .bind(entry.year)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn set_employment(
        &mut self,
        email: &str,
        role: Role,
        status: EmploymentStatus,
        employment: Option<&Employment>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = ?, status = ?, hr_email = ?, company_name = ?, company_logo_url = ?
            WHERE email = ?
            "#,
        )
        .bind(role.as_ref())
        .bind(status.as_ref())
        .bind(employment.map(|e| e.hr_email.as_str()))
        .bind(employment.and_then(|e| e.company_name.as_deref()))
        .bind(employment.and_then(|e| e.company_logo_url.as_deref()))
        .bind(email)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_team_count(&mut self, hr_email: &str, delta: i32) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET team_member_count = CAST(team_member_count AS SIGNED) + ?
            WHERE email = ? AND CAST(team_member_count AS SIGNED) + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(hr_email)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_member(&mut self, member: &NewCompanyMember) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO company_members (hr_email, employee_email, employee_name, joined_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&member.hr_email)
        .bind(&member.employee_email)
        .bind(&member.employee_name)
        .bind(member.joined_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn delete_member(&mut self, hr_email: &str, employee_email: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM company_members WHERE hr_email = ? AND employee_email = ?")
                .bind(hr_email)
                .bind(employee_email)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
