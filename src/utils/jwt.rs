use jsonwebtoken::{decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use utoipa::ToSchema;

static JWT_CONFIG: OnceLock<crate::config::jwt::JwtConfig> = OnceLock::new();

/// Initialize JWT config. Must be called once at startup.
pub fn init_jwt_config(config: crate::config::jwt::JwtConfig) -> anyhow::Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> &'static crate::config::jwt::JwtConfig {
    JWT_CONFIG
        .get()
        .expect("JWT config not initialized, call init_jwt_config() at startup")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Access/refresh pair handed out on login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    /// Short-lived access token
    pub access: String,
    /// Long-lived refresh token
    pub refresh: String,
}

fn encode_token(user_id: i32, token_type: TokenType, ttl: u64) -> Result<String, Error> {
    let config = get_config();
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl as usize,
        iat: now,
        jti: uuid::Uuid::new_v4().simple().to_string(),
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

pub fn encode_access_token(user_id: i32) -> Result<String, Error> {
    encode_token(user_id, TokenType::Access, get_config().access_token_expiry)
}

pub fn encode_refresh_token(user_id: i32) -> Result<String, Error> {
    encode_token(user_id, TokenType::Refresh, get_config().refresh_token_expiry)
}

pub fn encode_token_pair(user_id: i32) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access: encode_access_token(user_id)?,
        refresh: encode_refresh_token(user_id)?,
    })
}

pub fn decode_jwt(token: &str) -> Result<Claims, Error> {
    let config = get_config();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let config = crate::config::jwt::JwtConfig {
                secret: "unit_test_secret_that_is_long_enough_for_hs256".to_string(),
                access_token_expiry: 300,
                refresh_token_expiry: 86_400,
            };
            let _ = init_jwt_config(config);
        });
    }

    #[test]
    fn token_pair_carries_both_types() {
        ensure_config();
        let pair = encode_token_pair(42).unwrap();

        let access = decode_jwt(&pair.access).unwrap();
        assert_eq!(access.user_id(), Some(42));
        assert_eq!(access.token_type, TokenType::Access);

        let refresh = decode_jwt(&pair.refresh).unwrap();
        assert_eq!(refresh.user_id(), Some(42));
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn every_token_gets_its_own_jti() {
        ensure_config();
        let a = decode_jwt(&encode_access_token(1).unwrap()).unwrap();
        let b = decode_jwt(&encode_access_token(1).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = encode_access_token(42).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_jwt(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let config = get_config();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            jti: "expired".to_string(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&token).is_err());
    }

    #[test]
    fn non_numeric_subject_has_no_user_id() {
        let claims = Claims {
            sub: "abc".to_string(),
            exp: 0,
            iat: 0,
            jti: String::new(),
            token_type: TokenType::Access,
        };
        assert_eq!(claims.user_id(), None);
    }
}
