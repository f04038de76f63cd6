use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}


#[cfg(test)]
mod tests {
    use super::testing::mint_token;
    use super::*;

    #[test]
    fn accepts_token_signed_with_same_secret() {
        let token = mint_token("jane@acme.io", "s3cret", 600);
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.email, "jane@acme.io");
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = mint_token("jane@acme.io", "s3cret", 600);
        assert!(verify_token(&token, "other").is_err());
    }
}
