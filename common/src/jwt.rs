use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

/// Claims carried by the access tokens of the identity provider.
/// `sub` is the user id that checkout metadata and subscription rows refer to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
}

pub struct ClaimsSpec {
    pub user_id: String,
    pub email: Option<String>,
}

/// Signs an access token the same way the identity provider does (HS256).
pub fn generate_jwt(spec: ClaimsSpec, secret: &str, audience: &str, hours: i64) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::Internal("Token expiration overflow".to_string()))?
        .timestamp();

    let claims = AuthClaims {
        sub: spec.user_id,
        email: spec.email,
        aud: audience.to_string(),
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret and the expected audience.
pub fn validate_jwt(token: &str, secret: &str, audience: &str) -> Res<AuthClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let token_data = jsonwebtoken::decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn spec(user_id: &str) -> ClaimsSpec {
        ClaimsSpec {
            user_id: user_id.to_string(),
            email: Some("founder@example.com".to_string()),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let token = generate_jwt(spec("u1"), SECRET, "authenticated", 1).unwrap();
        let claims = validate_jwt(&token, SECRET, "authenticated").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("founder@example.com"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt(spec("u1"), SECRET, "authenticated", 1).unwrap();
        assert!(validate_jwt(&token, "another-secret", "authenticated").is_err());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let token = generate_jwt(spec("u1"), SECRET, "anon", 1).unwrap();
        assert!(validate_jwt(&token, SECRET, "authenticated").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_jwt(spec("u1"), SECRET, "authenticated", -2).unwrap();
        assert!(validate_jwt(&token, SECRET, "authenticated").is_err());
    }
}
