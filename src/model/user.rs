use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::role::Role;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum EmploymentStatus {
    #[serde(rename = "available")]
    #[strum(serialize = "available")]
    Available,
    #[serde(rename = "in job")]
    #[strum(serialize = "in job")]
    InJob,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub photo_url: Option<String>,
    pub role: Role,
    pub status: EmploymentStatus,
    /// HR manager this user works for (employees only)
    pub hr_email: Option<String>,
    pub company_name: Option<String>,
    pub company_logo_url: Option<String>,
    /// Roster size (HR only)
    pub team_member_count: u32,
    /// Purchased package (HR only)
    pub package_name: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub role: Role,
    pub company_name: Option<String>,
    pub company_logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            photo_url: self.photo_url,
            role: self.role,
            status: EmploymentStatus::Available,
            hr_email: None,
            company_name: self.company_name,
            company_logo_url: self.company_logo_url,
            team_member_count: 0,
            package_name: None,
            created_at: self.created_at,
        }
    }
}

/// Company fields copied onto an employee when they join a roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Employment {
    pub hr_email: String,
    pub company_name: Option<String>,
    pub company_logo_url: Option<String>,
}
