use crate::api::asset::CreateAsset;
use crate::api::asset_request::{CountResponse, SubmitRequest};
use crate::api::company::AddMember;
use crate::api::user::{PackageBody, RoleFlags, UpsertUser};
use crate::model::asset::{Asset, AssetPatch, AssetType};
use crate::model::asset_request::{AssetRequest, RequestStatus};
use crate::model::company::CompanyMember;
use crate::model::ledger::{LedgerEntry, TypeCount};
use crate::model::role::Role;
use crate::model::user::{EmploymentStatus, User};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetFlow API",
        version = "1.0.0",
        description = r#"
## Asset Management Portal

This API backs an **HR / employee asset portal**: HR managers keep an inventory of company assets and a roster of employees, and employees request, return and track those assets.

### 🔹 Key Features
- **Users**
  - First sign-in registration, role flags for dashboard routing
- **Assets**
  - Add, update, delete and count assets held by an HR manager
- **Requests**
  - Submit, approve, reject, return and cancel asset requests
  - Monthly request history for employees
- **Company**
  - Add and remove employees, team size
- **Reports & Package**
  - Request breakdown by asset type, purchased package bookkeeping

### 🔐 Security
Every `/api` endpoint expects a **JWT Bearer token** whose `email` claim identifies the caller.
Roles (`user`, `employee`, `hr`) are resolved from the user table.

### 📦 Response Format
- JSON-based RESTful responses
- Errors are `{"message": "..."}` with a matching status code

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::user::upsert_user,
        crate::api::user::current_user,
        crate::api::user::role_flags,
        crate::api::user::record_package,
        crate::api::user::get_package,

        crate::api::asset::add_asset,
        crate::api::asset::asset_count,
        crate::api::asset::get_asset,
        crate::api::asset::update_asset,
        crate::api::asset::delete_asset,

        crate::api::asset_request::submit_request,
        crate::api::asset_request::approve_request,
        crate::api::asset_request::reject_request,
        crate::api::asset_request::return_asset,
        crate::api::asset_request::cancel_request,
        crate::api::asset_request::get_request,
        crate::api::asset_request::monthly_requests,
        crate::api::asset_request::pending_count,
        crate::api::asset_request::own_request_count,

        crate::api::report::asset_type_breakdown,

        crate::api::company::add_member,
        crate::api::company::remove_member,
        crate::api::company::team_count
    ),
    components(
        schemas(
            Role,
            User,
            EmploymentStatus,
            UpsertUser,
            RoleFlags,
            PackageBody,
            Asset,
            AssetType,
            AssetPatch,
            CreateAsset,
            AssetRequest,
            RequestStatus,
            SubmitRequest,
            CountResponse,
            LedgerEntry,
            TypeCount,
            CompanyMember,
            AddMember
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Sign-in and role APIs"),
        (name = "Assets", description = "Asset inventory APIs"),
        (name = "Requests", description = "Asset request lifecycle APIs"),
        (name = "Reports", description = "Reporting APIs"),
        (name = "Company", description = "Company roster APIs"),
        (name = "Package", description = "Package bookkeeping APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
