use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::{auth::auth::AuthUser, error::AppError, model::role::Role, store::Store};

/// Caller whose role has been resolved against the user table.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub email: String,
    pub role: Role,
}

/// Resolves roles by email and gates handlers on them.
///
/// Roles are cached for a short TTL. Anything that changes a role must call
/// [`AccessGuard::forget`] afterwards.
pub struct AccessGuard {
    store: Arc<dyn Store>,
    roles: Cache<String, Role>,
}

impl AccessGuard {
    pub fn new(store: Arc<dyn Store>, ttl: Duration, capacity: u64) -> Self {
        Self {
            store,
            roles: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// `None` when the email has never signed in.
    pub async fn role_of(&self, email: &str) -> Result<Option<Role>, AppError> {
        if let Some(role) = self.roles.get(email).await {
            return Ok(Some(role));
        }

        let Some(user) = self.store.find_user(email).await? else {
            return Ok(None);
        };

        debug!(email, role = %user.role, "Role resolved from store");
        self.roles.insert(email.to_string(), user.role).await;
        Ok(Some(user.role))
    }

    pub async fn resolve(&self, auth: &AuthUser) -> Result<Caller, AppError> {
        match self.role_of(&auth.email).await? {
            Some(role) => Ok(Caller {
                email: auth.email.clone(),
                role,
            }),
            None => Err(AppError::forbidden("Forbidden access")),
        }
    }

    pub async fn require(&self, auth: &AuthUser, required: Role) -> Result<Caller, AppError> {
        self.require_any(auth, &[required]).await
    }

    pub async fn require_any(&self, auth: &AuthUser, allowed: &[Role]) -> Result<Caller, AppError> {
        let caller = self.resolve(auth).await?;
        if allowed.contains(&caller.role) {
            Ok(caller)
        } else {
            debug!(email = %caller.email, role = %caller.role, ?allowed, "Role check failed");
            Err(AppError::forbidden("Forbidden access"))
        }
    }

    pub async fn forget(&self, email: &str) {
        self.roles.invalidate(email).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn guard_over(store: Arc<MemoryStore>) -> AccessGuard {
        AccessGuard::new(store, Duration::from_secs(60), 100)
    }

    fn auth(email: &str) -> AuthUser {
        AuthUser {
            email: email.to_string(),
        }
    }

    #[actix_web::test]
    async fn employee_is_refused_hr_operations() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user("hr@acme.io", "Hannah", Role::Hr).await;
        store
            .seed_employee("e1@acme.io", "Eli", "hr@acme.io")
            .await;
        let guard = guard_over(store);

        let err = guard.require(&auth("e1@acme.io"), Role::Hr).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let caller = guard.require(&auth("hr@acme.io"), Role::Hr).await.unwrap();
        assert_eq!(caller.role, Role::Hr);
    }

    #[actix_web::test]
    async fn unknown_caller_is_forbidden() {
        let guard = guard_over(Arc::new(MemoryStore::new()));
        let err = guard
            .require_any(&auth("ghost@acme.io"), &[Role::User, Role::Employee, Role::Hr])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn cached_role_survives_until_forgotten() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user("u@acme.io", "Uma", Role::User).await;
        let guard = guard_over(store.clone());

        assert_eq!(guard.role_of("u@acme.io").await.unwrap(), Some(Role::User));

        // Role changes behind the cache's back.
        let mut uow = store.begin().await.unwrap();
        uow.set_employment(
            "u@acme.io",
            Role::Employee,
            crate::model::user::EmploymentStatus::InJob,
            None,
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(guard.role_of("u@acme.io").await.unwrap(), Some(Role::User));
        guard.forget("u@acme.io").await;
        assert_eq!(guard.role_of("u@acme.io").await.unwrap(), Some(Role::Employee));
    }
}
