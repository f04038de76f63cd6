use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyMember {
    pub id: u64,
    pub hr_email: String,
    pub employee_email: String,
    pub employee_name: String,
    #[schema(format = "date-time", value_type = String)]
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompanyMember {
    pub hr_email: String,
    pub employee_email: String,
    pub employee_name: String,
    pub joined_at: DateTime<Utc>,
}

impl NewCompanyMember {
    pub fn into_member(self, id: u64) -> CompanyMember {
        CompanyMember {
            id,
            hr_email: self.hr_email,
            employee_email: self.employee_email,
            employee_name: self.employee_name,
            joined_at: self.joined_at,
        }
    }
}
