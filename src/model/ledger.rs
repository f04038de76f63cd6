use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    asset::AssetType,
    asset_request::NewAssetRequest,
};

/// Append-only copy of a request taken when it was submitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    pub id: u64,
    pub request_id: u64,
    pub asset_id: u64,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub requester_email: String,
    pub holder_email: String,
    pub note: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    /// Calendar month, 1-12
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub request_id: u64,
    pub asset_id: u64,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub requester_email: String,
    pub holder_email: String,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub month: u32,
    pub year: i32,
}

impl NewLedgerEntry {
    pub fn from_request(request_id: u64, request: &NewAssetRequest) -> Self {
        Self {
            request_id,
            asset_id: request.asset_id,
            asset_name: request.asset_name.clone(),
            asset_type: request.asset_type,
            requester_email: request.requester_email.clone(),
            holder_email: request.holder_email.clone(),
            note: request.note.clone(),
            requested_at: request.requested_at,
            month: request.requested_at.month(),
            year: request.requested_at.year(),
        }
    }

    pub fn into_entry(self, id: u64) -> LedgerEntry {
        LedgerEntry {
            id,
            request_id: self.request_id,
            asset_id: self.asset_id,
            asset_name: self.asset_name,
            asset_type: self.asset_type,
            requester_email: self.requester_email,
            holder_email: self.holder_email,
            note: self.note,
            requested_at: self.requested_at,
            month: self.month,
            year: self.year,
        }
    }
}

/// One row of the returnable / non-returnable breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TypeCount {
    pub asset_type: AssetType,
    #[schema(example = 4)]
    pub count: i64,
}
