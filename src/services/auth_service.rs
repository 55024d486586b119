use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::models::Identity;

/// Hashing cost for stored passwords.
const BCRYPT_COST: u32 = 10;

/// How long an issued token stays valid.
const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Claims carried by the tokens this service issues and validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    pub full_name: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// The identity these claims vouch for.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

// Get the auth token from request headers
pub fn get_auth_token(headers: &HeaderMap) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = headers
            .get(header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for cookie in cookie::Cookie::split_parse(cookie_header) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &validation)
}

// Issue a signed token for an authenticated identity
pub fn issue_jwt(identity: &Identity, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: identity.id,
        full_name: identity.full_name.clone(),
        email: identity.email.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Check a password against a stored hash. A malformed hash counts as a
/// mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            error!("Password verification failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            full_name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let alice = identity();
        let token = issue_jwt(&alice, "secret").unwrap();
        let data = validate_jwt(&token, "secret").unwrap();
        assert_eq!(data.claims.identity(), alice);
        assert!(data.claims.exp > data.claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_jwt(&identity(), "secret").unwrap();
        assert!(validate_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn bearer_header_and_cookie_both_carry_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(get_auth_token(&headers), Ok("abc123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; auth_token=xyz789".parse().unwrap());
        assert_eq!(get_auth_token(&headers), Ok("xyz789".to_string()));

        assert!(get_auth_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }
}
