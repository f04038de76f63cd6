use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    auth::guard::Caller,
    error::{AppError, AppResult},
    model::{
        company::{CompanyMember, NewCompanyMember},
        role::Role,
        user::{EmploymentStatus, Employment, User},
    },
    service::lifecycle::Clock,
    store::Store,
};

/// Company membership. Callers must drop cached roles of the affected
/// employee afterwards.
pub struct Roster {
    store: Arc<dyn Store>,
    clock: Clock,
}

impl Roster {
    pub fn new(store: Arc<dyn Store>, clock: Clock) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self))]
    pub async fn add_member(&self, hr_email: &str, employee_email: &str) -> AppResult<CompanyMember> {
        let mut uow = self.store.begin().await?;

        let hr = uow
            .lock_user(hr_email)
            .await?
            .ok_or_else(|| AppError::forbidden("Unknown HR"))?;
        let target = uow
            .lock_user(employee_email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {employee_email} not found")))?;

        if target.role != Role::User {
            return Err(AppError::conflict(format!(
                "{employee_email} is already {}",
                target.role
            )));
        }

        let employment = Employment {
            hr_email: hr.email.clone(),
            company_name: hr.company_name.clone(),
            company_logo_url: hr.company_logo_url.clone(),
        };
        uow.set_employment(
            employee_email,
            Role::Employee,
            EmploymentStatus::InJob,
            Some(&employment),
        )
        .await?;
        if !uow.adjust_team_count(hr_email, 1).await? {
            return Err(AppError::conflict("Team counter changed, try again"));
        }

        let member = NewCompanyMember {
            hr_email: hr.email,
            employee_email: target.email,
            employee_name: target.name,
            joined_at: (self.clock)(),
        };
        let id = uow.insert_member(&member).await?;
        uow.commit().await?;

        info!(member_id = id, "Employee added to company");
        Ok(member.into_member(id))
    }

    #[instrument(skip(self))]
    pub async fn remove_member(&self, hr_email: &str, employee_email: &str) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        // HR row first, same order as add_member.
        uow.lock_user(hr_email)
            .await?
            .ok_or_else(|| AppError::forbidden("Unknown HR"))?;
        let on_roster = uow
            .lock_user(employee_email)
            .await?
            .is_some_and(|u| u.hr_email.as_deref() == Some(hr_email));
        if !on_roster || !uow.delete_member(hr_email, employee_email).await? {
            return Err(AppError::not_found(format!(
                "{employee_email} is not on your team"
            )));
        }

        uow.set_employment(employee_email, Role::User, EmploymentStatus::Available, None)
            .await?;
        if !uow.adjust_team_count(hr_email, -1).await? {
            warn!(hr_email, "Team counter already at zero");
        }
        uow.commit().await?;

        info!("Employee removed from company");
        Ok(())
    }

    /// Size of the caller's team: their own roster for HR, their HR's for
    /// employees.
    pub async fn team_count(&self, caller: &Caller) -> AppResult<i64> {
        let hr_email = match caller.role {
            Role::Hr => caller.email.clone(),
            _ => self
                .store
                .find_user(&caller.email)
                .await?
                .and_then(|u: User| u.hr_email)
                .ok_or_else(|| AppError::forbidden("Not part of a company"))?,
        };
        Ok(self.store.count_members(&hr_email).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Utc;

    const HR: &str = "hr@acme.io";

    async fn setup() -> (Arc<MemoryStore>, Roster) {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(HR, "Hannah", Role::Hr).await;
        store.seed_user("u@acme.io", "Uma", Role::User).await;
        let roster = Roster::new(store.clone(), Utc::now);
        (store, roster)
    }

    #[actix_web::test]
    async fn adding_member_promotes_user_and_counts_team() {
        let (store, roster) = setup().await;

        let member = roster.add_member(HR, "u@acme.io").await.unwrap();
        assert_eq!(member.employee_name, "Uma");

        let user = store.find_user("u@acme.io").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.status, EmploymentStatus::InJob);
        assert_eq!(user.hr_email.as_deref(), Some(HR));
        assert_eq!(user.company_name.as_deref(), Some("Acme"));

        let hr = store.find_user(HR).await.unwrap().unwrap();
        assert_eq!(hr.team_member_count, 1);
        assert_eq!(store.members().await.len(), 1);

        let err = roster.add_member(HR, "u@acme.io").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn removing_member_restores_user() {
        let (store, roster) = setup().await;
        roster.add_member(HR, "u@acme.io").await.unwrap();

        roster.remove_member(HR, "u@acme.io").await.unwrap();

        let user = store.find_user("u@acme.io").await.unwrap().unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.status, EmploymentStatus::Available);
        assert!(user.hr_email.is_none());
        assert_eq!(store.find_user(HR).await.unwrap().unwrap().team_member_count, 0);
        assert!(store.members().await.is_empty());

        let err = roster.remove_member(HR, "u@acme.io").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn unknown_user_cannot_be_added() {
        let (_store, roster) = setup().await;
        let err = roster.add_member(HR, "nobody@acme.io").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn employees_see_their_hr_team_size() {
        let (_store, roster) = setup().await;
        roster.add_member(HR, "u@acme.io").await.unwrap();

        let employee = Caller {
            email: "u@acme.io".into(),
            role: Role::Employee,
        };
        let hr = Caller {
            email: HR.into(),
            role: Role::Hr,
        };
        assert_eq!(roster.team_count(&employee).await.unwrap(), 1);
        assert_eq!(roster.team_count(&hr).await.unwrap(), 1);
    }
}
