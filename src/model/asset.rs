use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AssetType {
    Returnable,
    NonReturnable,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Laptop",
    "asset_type": "returnable",
    "quantity": 3,
    "pending_count": 0,
    "holder_email": "hr@company.com",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub asset_type: AssetType,
    /// Units still available to hand out
    pub quantity: u32,
    /// Slots held by `Requested` and `Rejected` requests; released on approve
    /// or cancel
    pub pending_count: u32,
    /// HR manager holding the inventory
    pub holder_email: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub asset_type: AssetType,
    pub quantity: u32,
    pub holder_email: String,
    pub created_at: DateTime<Utc>,
}

impl NewAsset {
    pub fn into_asset(self, id: u64) -> Asset {
        Asset {
            id,
            name: self.name,
            asset_type: self.asset_type,
            quantity: self.quantity,
            pending_count: 0,
            holder_email: self.holder_email,
            created_at: self.created_at,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AssetPatch {
    #[schema(example = "Laptop (14 inch)")]
    pub name: Option<String>,
    pub asset_type: Option<AssetType>,
    #[schema(example = 5)]
    pub quantity: Option<u32>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.asset_type.is_none() && self.quantity.is_none()
    }

    pub fn apply(&self, asset: &mut Asset) {
        if let Some(name) = &self.name {
            asset.name = name.clone();
        }
        if let Some(asset_type) = self.asset_type {
            asset.asset_type = asset_type;
        }
        if let Some(quantity) = self.quantity {
            asset.quantity = quantity;
        }
    }
}
