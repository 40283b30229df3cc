use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT payload issued by the accounts service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "accountId")]
    pub account_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(account_id: i64, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            account_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Authenticated caller identity for a single request.
///
/// `account_id` is the tenant boundary for every repository call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub account_id: i64,
}

impl From<Claims> for Token {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.account_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

/// Sign claims with the shared secret
pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_account_id() {
        let token = generate_jwt(&Claims::new(42, 1), SECRET).unwrap();
        let claims = validate_jwt(&token, SECRET).unwrap();
        assert_eq!(Token::from(claims), Token { account_id: 42 });
    }

    #[test]
    fn claims_use_camel_case_account_id() {
        let value = serde_json::to_value(Claims::new(5, 1)).unwrap();
        assert_eq!(value["accountId"], 5);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt(&Claims::new(42, 1), SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let claims = Claims {
            account_id: 42,
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(generate_jwt(&Claims::new(1, 1), ""), Err(JwtError::InvalidSecret)));
        assert!(matches!(validate_jwt("abc", ""), Err(JwtError::InvalidSecret)));
    }
}
