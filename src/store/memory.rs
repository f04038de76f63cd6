//! In-memory [`Store`] for tests. A unit of work holds the table lock and
//! edits a copy, so dropping it without commit discards every staged write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::lock::{Mutex, MutexGuard};

use super::{Store, StoreError, StoreResult, UnitOfWork, apply_delta};
use crate::model::{
    asset::{Asset, AssetPatch, AssetType, NewAsset},
    asset_request::{AssetRequest, NewAssetRequest, RequestStatus},
    company::{CompanyMember, NewCompanyMember},
    ledger::{LedgerEntry, NewLedgerEntry, TypeCount},
    role::Role,
    user::{EmploymentStatus, Employment, NewUser, User},
};

#[derive(Clone, Default)]
struct Tables {
    next_id: u64,
    users: BTreeMap<String, User>,
    assets: BTreeMap<u64, Asset>,
    requests: BTreeMap<u64, AssetRequest>,
    ledger: Vec<LedgerEntry>,
    members: Vec<CompanyMember>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_ledger: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later ledger append fail like a dropped connection.
    pub fn fail_ledger_appends(&self) {
        self.fail_ledger.store(true, Ordering::SeqCst);
    }

    pub async fn seed_user(&self, email: &str, name: &str, role: Role) -> User {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let mut user = NewUser {
            email: email.to_string(),
            name: name.to_string(),
            photo_url: None,
            role,
            company_name: None,
            company_logo_url: None,
            created_at: Utc::now(),
        }
        .into_user(id);
        if role == Role::Hr {
            user.company_name = Some("Acme".to_string());
        }
        tables.users.insert(user.email.clone(), user.clone());
        user
    }

    /// Seeds an employee already on `hr_email`'s roster.
    pub async fn seed_employee(&self, email: &str, name: &str, hr_email: &str) -> User {
        self.seed_user(email, name, Role::Employee).await;
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.members.push(CompanyMember {
            id,
            hr_email: hr_email.to_string(),
            employee_email: email.to_string(),
            employee_name: name.to_string(),
            joined_at: Utc::now(),
        });
        if let Some(hr) = tables.users.get_mut(hr_email) {
            hr.team_member_count += 1;
        }
        let user = tables
            .users
            .get_mut(email)
            .expect("employee was just seeded");
        user.status = EmploymentStatus::InJob;
        user.hr_email = Some(hr_email.to_string());
        user.clone()
    }

    pub async fn seed_asset(
        &self,
        holder_email: &str,
        name: &str,
        asset_type: AssetType,
        quantity: u32,
    ) -> Asset {
        self.insert_asset(&NewAsset {
            name: name.to_string(),
            asset_type,
            quantity,
            holder_email: holder_email.to_string(),
            created_at: Utc::now(),
        })
        .await
        .expect("memory insert cannot fail")
    }

    pub async fn ledger(&self) -> Vec<LedgerEntry> {
        self.tables.lock().await.ledger.clone()
    }

    pub async fn requests(&self) -> Vec<AssetRequest> {
        self.tables.lock().await.requests.values().cloned().collect()
    }

    pub async fn members(&self) -> Vec<CompanyMember> {
        self.tables.lock().await.members.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork + '_>> {
        let committed = self.tables.lock().await;
        let staged = committed.clone();
        Ok(Box::new(MemoryUnitOfWork {
            committed,
            staged,
            fail_ledger: self.fail_ledger.load(Ordering::SeqCst),
        }))
    }

    async fn find_user(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(email).cloned())
    }

    async fn insert_user_if_absent(&self, user: &NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.users.get(&user.email) {
            return Ok(existing.clone());
        }
        let id = tables.next_id();
        let stored = user.clone().into_user(id);
        tables.users.insert(stored.email.clone(), stored.clone());
        Ok(stored)
    }

    async fn set_package(&self, email: &str, package_name: &str) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.users.get_mut(email) {
            Some(user) => {
                user.package_name = Some(package_name.to_string());
                true
            }
            None => false,
        })
    }

    async fn find_asset(&self, id: u64) -> StoreResult<Option<Asset>> {
        Ok(self.tables.lock().await.assets.get(&id).cloned())
    }

    async fn insert_asset(&self, asset: &NewAsset) -> StoreResult<Asset> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let stored = asset.clone().into_asset(id);
        tables.assets.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_asset(
        &self,
        id: u64,
        holder_email: &str,
        patch: &AssetPatch,
    ) -> StoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        let mut tables = self.tables.lock().await;
        Ok(match tables.assets.get_mut(&id) {
            Some(asset) if asset.holder_email == holder_email => {
                patch.apply(asset);
                true
            }
            _ => false,
        })
    }

    async fn delete_unused_asset(&self, id: u64, holder_email: &str) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let in_use = tables
            .requests
            .values()
            .any(|r| r.asset_id == id && r.status != RequestStatus::Rejected);
        let held = matches!(tables.assets.get(&id), Some(a) if a.holder_email == holder_email);
        if !held || in_use {
            return Ok(false);
        }
        tables.assets.remove(&id);
        Ok(true)
    }

    async fn count_assets(&self, holder_email: &str) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .assets
            .values()
            .filter(|a| a.holder_email == holder_email)
            .count() as i64)
    }

    async fn find_request(&self, id: u64) -> StoreResult<Option<AssetRequest>> {
        Ok(self.tables.lock().await.requests.get(&id).cloned())
    }

    async fn count_requests(&self, holder_email: &str, status: RequestStatus) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.holder_email == holder_email && r.status == status)
            .count() as i64)
    }

    async fn count_requests_by(&self, requester_email: &str) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.requester_email == requester_email)
            .count() as i64)
    }

    async fn ledger_for_month(
        &self,
        requester_email: &str,
        month: u32,
        year: i32,
    ) -> StoreResult<Vec<LedgerEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<LedgerEntry> = tables
            .ledger
            .iter()
            .filter(|e| e.requester_email == requester_email && e.month == month && e.year == year)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn ledger_type_counts(&self, holder_email: &str) -> StoreResult<Vec<TypeCount>> {
        let tables = self.tables.lock().await;
        let mut counts: BTreeMap<String, (AssetType, i64)> = BTreeMap::new();
        for entry in tables.ledger.iter().filter(|e| e.holder_email == holder_email) {
            counts
                .entry(entry.asset_type.as_ref().to_string())
                .or_insert((entry.asset_type, 0))
                .1 += 1;
        }
        Ok(counts
            .into_values()
            .map(|(asset_type, count)| TypeCount { asset_type, count })
            .collect())
    }

    async fn count_members(&self, hr_email: &str) -> StoreResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.hr_email == hr_email)
            .count() as i64)
    }

    async fn close(&self) {}
}

struct MemoryUnitOfWork<'a> {
    committed: MutexGuard<'a, Tables>,
    staged: Tables,
    fail_ledger: bool,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork<'_> {
    async fn lock_asset(&mut self, id: u64) -> StoreResult<Option<Asset>> {
        Ok(self.staged.assets.get(&id).cloned())
    }

    async fn lock_request(&mut self, id: u64) -> StoreResult<Option<AssetRequest>> {
        Ok(self.staged.requests.get(&id).cloned())
    }

    async fn lock_user(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.staged.users.get(email).cloned())
    }

    async fn adjust_asset(&mut self, id: u64, quantity: i32, pending: i32) -> StoreResult<bool> {
        let Some(asset) = self.staged.assets.get_mut(&id) else {
            return Ok(false);
        };
        match (
            apply_delta(asset.quantity, quantity),
            apply_delta(asset.pending_count, pending),
        ) {
            (Some(q), Some(p)) => {
                asset.quantity = q;
                asset.pending_count = p;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_request(&mut self, request: &NewAssetRequest) -> StoreResult<u64> {
        let id = self.staged.next_id();
        self.staged
            .requests
            .insert(id, request.clone().into_request(id));
        Ok(id)
    }

    async fn transition_request(
        &mut self,
        id: u64,
        from: RequestStatus,
        to: RequestStatus,
        approved_at: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        match self.staged.requests.get_mut(&id) {
            Some(request) if request.status == from => {
                request.status = to;
                if approved_at.is_some() {
                    request.approved_at = approved_at;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_request(&mut self, id: u64) -> StoreResult<bool> {
        Ok(self.staged.requests.remove(&id).is_some())
    }

    async fn append_ledger(&mut self, entry: &NewLedgerEntry) -> StoreResult<u64> {
        if self.fail_ledger {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let id = self.staged.next_id();
        self.staged.ledger.push(entry.clone().into_entry(id));
        Ok(id)
    }

    async fn set_employment(
        &mut self,
        email: &str,
        role: Role,
        status: EmploymentStatus,
        employment: Option<&Employment>,
    ) -> StoreResult<bool> {
        let Some(user) = self.staged.users.get_mut(email) else {
            return Ok(false);
        };
        user.role = role;
        user.status = status;
        user.hr_email = employment.map(|e| e.hr_email.clone());
        user.company_name = employment.and_then(|e| e.company_name.clone());
        user.company_logo_url = employment.and_then(|e| e.company_logo_url.clone());
        Ok(true)
    }

    async fn adjust_team_count(&mut self, hr_email: &str, delta: i32) -> StoreResult<bool> {
        let Some(user) = self.staged.users.get_mut(hr_email) else {
            return Ok(false);
        };
        match apply_delta(user.team_member_count, delta) {
            Some(count) => {
                user.team_member_count = count;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_member(&mut self, member: &NewCompanyMember) -> StoreResult<u64> {
        let id = self.staged.next_id();
        self.staged.members.push(member.clone().into_member(id));
        Ok(id)
    }

    async fn delete_member(&mut self, hr_email: &str, employee_email: &str) -> StoreResult<bool> {
        let before = self.staged.members.len();
        self.staged
            .members
            .retain(|m| !(m.hr_email == hr_email && m.employee_email == employee_email));
        Ok(self.staged.members.len() < before)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork {
            mut committed,
            staged,
            ..
        } = *self;
        *committed = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        let asset = store
            .seed_asset("hr@acme.io", "Laptop", AssetType::Returnable, 2)
            .await;

        {
            let mut uow = store.begin().await.unwrap();
            assert!(uow.adjust_asset(asset.id, -1, 1).await.unwrap());
        }

        let stored = store.find_asset(asset.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
        assert_eq!(stored.pending_count, 0);
    }

    #[actix_web::test]
    async fn committed_unit_of_work_is_visible() {
        let store = MemoryStore::new();
        let asset = store
            .seed_asset("hr@acme.io", "Laptop", AssetType::Returnable, 2)
            .await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.adjust_asset(asset.id, -1, 1).await.unwrap());
        assert!(!uow.adjust_asset(asset.id, -5, 0).await.unwrap());
        uow.commit().await.unwrap();

        let stored = store.find_asset(asset.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.pending_count, 1);
    }
}
