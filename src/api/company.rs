use crate::{
    api::asset_request::CountResponse,
    auth::{auth::AuthUser, guard::AccessGuard},
    error::AppError,
    model::{company::CompanyMember, role::Role},
    service::roster::Roster,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AddMember {
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: String,
}

/* =========================
Add employee to the caller's company
========================= */
#[utoipa::path(
    post,
    path = "/api/company/members",
    request_body = AddMember,
    responses(
        (status = 201, description = "Employee added", body = CompanyMember),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already belongs to a company")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn add_member(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    roster: web::Data<Roster>,
    payload: web::Json<AddMember>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let email = payload.into_inner().email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".into()));
    }

    let member = roster.add_member(&caller.email, &email).await?;
    guard.forget(&email).await;

    Ok(HttpResponse::Created().json(member))
}

/* =========================
Remove employee from the caller's company
========================= */
#[utoipa::path(
    delete,
    path = "/api/company/members/{email}",
    params(
        ("email" = String, Path, description = "Employee email")
    ),
    responses(
        (status = 200, description = "Employee removed", body = Object, example = json!({
            "message": "Employee removed"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not on the caller's team")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn remove_member(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    roster: web::Data<Roster>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let email = path.into_inner().trim().to_lowercase();

    roster.remove_member(&caller.email, &email).await?;
    guard.forget(&email).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee removed"
    })))
}

#[utoipa::path(
    get,
    path = "/api/company/members/count",
    responses(
        (status = 200, description = "Team size", body = CountResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn team_count(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    roster: web::Data<Roster>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require_any(&auth, &[Role::Hr, Role::Employee]).await?;
    let count = roster.team_count(&caller).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}
