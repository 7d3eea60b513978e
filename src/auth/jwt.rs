use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Tokens are minted by the identity provider; `sub` is its opaque user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Signs an access token with the shared secret. Used by local tooling and
/// tests; production tokens come from the identity provider.
pub fn create_access_token(user_id: &str, ttl_secs: i64, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
        token_type: TokenType::Access,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create access token: {}", e)))
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

/// Verifies `token` and returns the user id of an access token.
pub fn authenticate(token: &str, config: &Config) -> AppResult<String> {
    let token_data = verify_token(token, config)?;
    if token_data.claims.token_type != TokenType::Access || token_data.claims.sub.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::config;

    #[test]
    fn test_access_token_round_trip() {
        let cfg = config();
        let token = create_access_token("pilot-7", 300, &cfg).unwrap();
        assert_eq!(authenticate(&token, &cfg).unwrap(), "pilot-7");
    }

    #[test]
    fn test_expired_token_rejected() {
        let cfg = config();
        let token = create_access_token("pilot-7", -3600, &cfg).unwrap();
        assert!(matches!(authenticate(&token, &cfg), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let cfg = config();
        let token = create_access_token("pilot-7", 300, &cfg).unwrap();
        let mut other = config();
        other.jwt_secret = "another-secret".into();
        assert!(matches!(authenticate(&token, &other), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_refresh_token_rejected() {
        let cfg = config();
        let now = Utc::now();
        let claims = Claims {
            sub: "pilot-7".into(),
            exp: (now + Duration::seconds(300)).timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(matches!(authenticate(&token, &cfg), Err(AppError::Unauthorized)));
    }
}
