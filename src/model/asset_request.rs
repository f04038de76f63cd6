use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::asset::AssetType;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum RequestStatus {
    Requested,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Only `Requested` may move, and only to a terminal status.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Requested, RequestStatus::Approved)
                | (RequestStatus::Requested, RequestStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "asset_id": 1,
    "asset_name": "Laptop",
    "asset_type": "returnable",
    "requester_email": "jane@company.com",
    "requester_name": "Jane Doe",
    "holder_email": "hr@company.com",
    "note": "Needed for onboarding",
    "status": "Requested",
    "requested_at": "2026-01-01T00:00:00Z",
    "approved_at": null
}))]
pub struct AssetRequest {
    pub id: u64,
    pub asset_id: u64,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub requester_email: String,
    pub requester_name: String,
    /// HR manager who approves or rejects
    pub holder_email: String,
    pub note: Option<String>,
    pub status: RequestStatus,
    #[schema(format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAssetRequest {
    pub asset_id: u64,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub requester_email: String,
    pub requester_name: String,
    pub holder_email: String,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl NewAssetRequest {
    pub fn into_request(self, id: u64) -> AssetRequest {
        AssetRequest {
            id,
            asset_id: self.asset_id,
            asset_name: self.asset_name,
            asset_type: self.asset_type,
            requester_email: self.requester_email,
            requester_name: self.requester_name,
            holder_email: self.holder_email,
            note: self.note,
            status: RequestStatus::Requested,
            requested_at: self.requested_at,
            approved_at: None,
        }
    }
}
