use botdesk_core::{BotdeskError, BotdeskResult};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Access tokens live for one hour.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims for a session access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Create an access token for a user.
///
/// Uses HS256 symmetric signing with the provided secret.
pub fn create_access_token(user_id: &str, email: &str, secret: &str) -> BotdeskResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        iat: now,
        exp: now + ACCESS_TOKEN_TTL_SECS,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| BotdeskError::Crypto(e.to_string()))
}

/// Validate an access token and return its claims.
pub fn validate_access_token(token: &str, secret: &str) -> BotdeskResult<AccessTokenClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();
    let token_data = decode::<AccessTokenClaims>(token, &key, &validation)
        .map_err(|e| BotdeskError::Auth(e.to_string()))?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-tests";
    const OTHER_SECRET: &str = "different-secret-key-for-jwt";
    const USER: &str = "6f1c2b1e-user";
    const EMAIL: &str = "owner@shop.test";

    #[test]
    fn access_token_roundtrip() {
        let token = create_access_token(USER, EMAIL, SECRET).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, USER);
        assert_eq!(claims.email.as_deref(), Some(EMAIL));
    }

    #[test]
    fn access_token_wrong_secret_fails() {
        let token = create_access_token(USER, EMAIL, SECRET).unwrap();
        assert!(validate_access_token(&token, OTHER_SECRET).is_err());
    }

    #[test]
    fn access_token_has_one_hour_expiry() {
        let token = create_access_token(USER, EMAIL, SECRET).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn expired_token_validation_fails() {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: USER.to_string(),
            email: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let err = validate_access_token(&token, SECRET).unwrap_err();
        assert!(err.to_string().contains("ExpiredSignature"), "got: {err}");
    }
}
