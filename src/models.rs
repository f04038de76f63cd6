use serde::{Deserialize, Serialize};

/// Bearer token claims minted by the sign-in service. Only `email` is trusted
/// as the caller identity; the role is always looked up.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub exp: usize,
}
