use crate::{
    api::asset_request::CountResponse,
    auth::{auth::AuthUser, guard::AccessGuard},
    error::AppError,
    model::{
        asset::{Asset, AssetPatch, AssetType, NewAsset},
        role::Role,
    },
    service::lifecycle::RequestLifecycle,
    store::Store,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAsset {
    #[schema(example = "Laptop")]
    pub name: String,
    pub asset_type: AssetType,
    #[schema(example = 10)]
    pub quantity: u32,
}

fn not_held(asset_id: u64) -> AppError {
    AppError::not_found(format!("Asset {asset_id} not found"))
}

/// Add an asset to the caller's inventory
#[utoipa::path(
    post,
    path = "/api/assets",
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn add_asset(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    lifecycle: web::Data<RequestLifecycle>,
    store: web::Data<dyn Store>,
    payload: web::Json<CreateAsset>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let payload = payload.into_inner();

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Asset name must not be empty".into()));
    }

    let asset = store
        .insert_asset(&NewAsset {
            name: name.to_string(),
            asset_type: payload.asset_type,
            quantity: payload.quantity,
            holder_email: caller.email,
            created_at: lifecycle.now(),
        })
        .await?;

    info!(asset_id = asset.id, "Asset added");
    Ok(HttpResponse::Created().json(asset))
}

#[utoipa::path(
    get,
    path = "/api/assets/{asset_id}",
    params(
        ("asset_id" = u64, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset found", body = Asset),
        (status = 404, description = "Asset not found", body = Object, example = json!({
            "message": "Asset 1 not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn get_asset(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    guard.resolve(&auth).await?;
    let asset_id = path.into_inner();

    let asset = store
        .find_asset(asset_id)
        .await?
        .ok_or_else(|| not_held(asset_id))?;

    Ok(HttpResponse::Ok().json(asset))
}

/// Partially update an asset held by the caller
#[utoipa::path(
    patch,
    path = "/api/assets/{asset_id}",
    params(
        ("asset_id" = u64, Path, description = "Asset ID")
    ),
    request_body = AssetPatch,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 400, description = "No fields provided"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn update_asset(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    payload: web::Json<AssetPatch>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let asset_id = path.into_inner();
    let mut patch = payload.into_inner();

    if let Some(name) = patch.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Asset name must not be empty".into()));
        }
    }
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".into()));
    }

    if !store.update_asset(asset_id, &caller.email, &patch).await? {
        return Err(not_held(asset_id));
    }

    let asset = store
        .find_asset(asset_id)
        .await?
        .ok_or_else(|| not_held(asset_id))?;

    Ok(HttpResponse::Ok().json(asset))
}

/// Delete an asset that nobody is waiting for or holding
#[utoipa::path(
    delete,
    path = "/api/assets/{asset_id}",
    params(
        ("asset_id" = u64, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Asset still has open requests")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn delete_asset(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let asset_id = path.into_inner();

    match store.find_asset(asset_id).await? {
        Some(asset) if asset.holder_email == caller.email => {}
        _ => return Err(not_held(asset_id)),
    }

    if !store.delete_unused_asset(asset_id, &caller.email).await? {
        return Err(AppError::conflict(
            "Asset still has requests waiting or handed out",
        ));
    }

    info!(asset_id, "Asset deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[utoipa::path(
    get,
    path = "/api/assets/count",
    responses(
        (status = 200, description = "Number of assets held by the caller", body = CountResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assets"
)]
pub async fn asset_count(
    auth: AuthUser,
    guard: web::Data<AccessGuard>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let caller = guard.require(&auth, Role::Hr).await?;
    let count = store.count_assets(&caller.email).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}
