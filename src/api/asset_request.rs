use crate::{
    auth::{auth::AuthUser, guard::AccessGuard},
    error::AppError,
    model::{
        asset::Asset, asset_request::AssetRequest, asset_request::RequestStatus,
        ledger::LedgerEntry, role::Role,
    },
    service::lifecycle::RequestLifecycle,
    store::Store,
};
use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Default)]
pub struct SubmitRequest {
    /// Free-text note for the HR manager
    #[schema(example = "Needed for the new project")]
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    #[schema(example = 3)]
    pub count: i64,
}

/* =========================
Submit request (employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/assets/{asset_id}/requests",
    params(
        ("asset_id" = u64, Path, description = "Asset to request")
    ),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Request submitted", body = AssetRequest),
        (status = 403, description = "Not an employee of the asset's company"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset out of stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn submit_request(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<u64>,
    payload: Option<web::Json<SubmitRequest>>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Employee).await?;
    let asset_id = path.into_inner();
    let note = payload
        .map(|p| p.into_inner())
        .unwrap_or_default()
        .note
        .filter(|n| !n.trim().is_empty());

    let request = lifecycle
        .submit_request(asset_id, &caller.email, note)
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/* =========================
Approve request (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/assets/{asset_id}/requests/{request_id}/approve",
    params(
        ("asset_id" = u64, Path, description = "Asset the request refers to"),
        ("request_id" = u64, Path, description = "Request to approve")
    ),
    responses(
        (status = 200, description = "Request approved", body = AssetRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset or request not found"),
        (status = 409, description = "Request already processed or no units left")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn approve_request(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<(u64, u64)>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let (asset_id, request_id) = path.into_inner();

    let request = lifecycle
        .approve_request(&caller.email, asset_id, request_id)
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject request (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "Request to reject")
    ),
    responses(
        (status = 200, description = "Request rejected", body = AssetRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn reject_request(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;

    let request = lifecycle
        .reject_request(&caller.email, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Return asset (employee)
========================= */
#[utoipa::path(
    put,
    path = "/api/assets/{asset_id}/requests/{request_id}/return",
    params(
        ("asset_id" = u64, Path, description = "Asset being returned"),
        ("request_id" = u64, Path, description = "Approved request")
    ),
    responses(
        (status = 200, description = "Asset returned; request removed", body = Asset),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset or request not found"),
        (status = 409, description = "Request not approved or asset not returnable")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn return_asset(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<(u64, u64)>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Employee).await?;
    let (asset_id, request_id) = path.into_inner();

    let asset = lifecycle
        .return_asset(&caller.email, request_id, asset_id)
        .await?;

    Ok(HttpResponse::Ok().json(asset))
}

/* =========================
Cancel own request (employee)
========================= */
#[utoipa::path(
    delete,
    path = "/api/requests/{request_id}",
    params(
        ("request_id" = u64, Path, description = "Own request to withdraw")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = Object, example = json!({
            "message": "Request cancelled"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Approved requests must be returned")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn cancel_request(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Employee).await?;

    lifecycle
        .cancel_own_request(&caller.email, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request cancelled"
    })))
}

/// Request details for its requester or the HR holding the asset
#[utoipa::path(
    get,
    path = "/api/requests/{request_id}",
    params(
        ("request_id" = u64, Path, description = "Request to fetch")
    ),
    responses(
        (status = 200, description = "Request found", body = AssetRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn get_request(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.resolve(&auth).await?;

    let request = lifecycle
        .get_request(&caller.email, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Caller's requests made in the current calendar month, newest first
#[utoipa::path(
    get,
    path = "/api/requests/monthly",
    responses(
        (status = 200, description = "This month's ledger entries", body = [LedgerEntry]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn monthly_requests(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Employee).await?;
    let now = lifecycle.now();

    let entries = store
        .ledger_for_month(&caller.email, now.month(), now.year())
        .await?;

    Ok(HttpResponse::Ok().json(entries))
}

/// Requests waiting for the caller's decision
#[utoipa::path(
    get,
    path = "/api/requests/pending/count",
    responses(
        (status = 200, description = "Pending request count", body = CountResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn pending_count(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;

    let count = store
        .count_requests(&caller.email, RequestStatus::Requested)
        .await?;

    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

/// Caller's own requests still on record, whatever their status
#[utoipa::path(
    get,
    path = "/api/requests/mine/count",
    responses(
        (status = 200, description = "Own request count", body = CountResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Requests"
)]
pub async fn own_request_count(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Employee).await?;
    let count = store.count_requests_by(&caller.email).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}
