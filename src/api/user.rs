use crate::{
    auth::{auth::AuthUser, guard::AccessGuard},
    error::AppError,
    model::{
        role::Role,
        user::{NewUser, User},
    },
    service::lifecycle::RequestLifecycle,
    store::Store,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpsertUser {
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub photo_url: Option<String>,
    /// `user` (default) or `hr`; employees are only created through a roster
    pub role: Option<Role>,
    /// Required when registering as `hr`
    #[schema(example = "Acme Ltd")]
    pub company_name: Option<String>,
    pub company_logo_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RoleFlags {
    pub hr_role: bool,
    pub employee_role: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PackageBody {
    #[schema(example = "basic")]
    pub package_name: Option<String>,
}

fn not_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UpsertUser {
    fn into_new_user(self, email: &str, lifecycle: &RequestLifecycle) -> Result<NewUser, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name must not be empty".into()));
        }

        let role = self.role.unwrap_or(Role::User);
        let company_name = not_blank(self.company_name);
        match role {
            Role::Employee => {
                return Err(AppError::BadRequest(
                    "Employees join through an HR roster".into(),
                ));
            }
            Role::Hr if company_name.is_none() => {
                return Err(AppError::BadRequest(
                    "company_name is required for HR accounts".into(),
                ));
            }
            _ => {}
        }

        Ok(NewUser {
            email: email.to_string(),
            name,
            photo_url: not_blank(self.photo_url),
            role,
            company_name: if role == Role::Hr { company_name } else { None },
            company_logo_url: if role == Role::Hr {
                not_blank(self.company_logo_url)
            } else {
                None
            },
            created_at: lifecycle.now(),
        })
    }
}

/// Register the caller on first sign-in; returns the stored record unchanged
/// when it already exists
#[utoipa::path(
    put,
    path = "/api/user",
    request_body = UpsertUser,
    responses(
        (status = 200, description = "Stored user", body = User),
        (status = 400, description = "Invalid profile", body = Object, example = json!({
            "message": "company_name is required for HR accounts"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn upsert_user(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    store: web::Data<dyn Store>,
    payload: web::Json<UpsertUser>,
) -> Result<HttpResponse, AppError> {
    // Returning users get their record back whatever the payload says.
    if let Some(user) = store.find_user(&auth.email).await? {
        return Ok(HttpResponse::Ok().json(user));
    }

    let new_user = payload.into_inner().into_new_user(&auth.email, &lifecycle)?;
    let user = store.insert_user_if_absent(&new_user).await?;
    guard.forget(&user.email).await;

    info!(email = %user.email, role = %user.role, "User registered");

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Caller's user record", body = User),
        (status = 404, description = "Not registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn current_user(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_user(&auth.email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Role switches used by the frontend to pick a dashboard
#[utoipa::path(
    get,
    path = "/api/user/role",
    responses(
        (status = 200, description = "Role flags", body = RoleFlags)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn role_flags(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
) -> Result<HttpResponse, AppError> {
    let role = guard.role_of(&auth.email).await?;

    Ok(HttpResponse::Ok().json(RoleFlags {
        hr_role: role == Some(Role::Hr),
        employee_role: role == Some(Role::Employee),
    }))
}

#[utoipa::path(
    put,
    path = "/api/package",
    request_body = PackageBody,
    responses(
        (status = 200, description = "Package recorded", body = PackageBody),
        (status = 400, description = "Missing package name"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Package"
)]
pub async fn record_package(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
    payload: web::Json<PackageBody>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let package_name = not_blank(payload.into_inner().package_name)
        .ok_or_else(|| AppError::BadRequest("package_name is required".into()))?;

    if !store.set_package(&caller.email, &package_name).await? {
        return Err(AppError::not_found("User not found"));
    }

    info!(email = %caller.email, package_name = %package_name, "Package recorded");
    Ok(HttpResponse::Ok().json(PackageBody {
        package_name: Some(package_name),
    }))
}

#[utoipa::path(
    get,
    path = "/api/package",
    responses(
        (status = 200, description = "Purchased package, null when none", body = PackageBody),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Package"
)]
pub async fn get_package(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let package_name = store
        .find_user(&caller.email)
        .await?
        .and_then(|u| u.package_name);

    Ok(HttpResponse::Ok().json(PackageBody { package_name }))
}
