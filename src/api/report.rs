use crate::{
    auth::{auth::AuthUser, guard::AccessGuard},
    error::AppError,
    model::{ledger::TypeCount, role::Role},
    store::Store,
};
use actix_web::{HttpResponse, web};

/// Requests for the caller's assets, grouped by asset type
#[utoipa::path(
    get,
    path = "/api/reports/asset-types",
    responses(
        (status = 200, description = "Request counts per asset type", body = [TypeCount]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn asset_type_breakdown(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let counts = store.ledger_type_counts(&caller.email).await?;
    Ok(HttpResponse::Ok().json(counts))
}
