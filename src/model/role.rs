use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Role stored on the user record. Everyone starts as `User`; HR managers
/// register as `Hr`, and only the roster turns a `User` into an `Employee`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Employee,
    Hr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stored_form_is_lowercase() {
        assert_eq!(Role::Hr.as_ref(), "hr");
        assert_eq!(Role::from_str("employee").unwrap(), Role::Employee);
        assert_eq!(Role::from_str("admin"), Err(strum::ParseError::VariantNotFound));
    }
}
