//! JWT issuing and verification
//!
//! Access and refresh tokens are both HS256 JWTs signed with the same
//! secret. The `kind` claim keeps one from being accepted in place of the
//! other, and `jti` makes every issued token unique even within one second.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::permission::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub kind: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Tokens handed out on register, login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_ttl_secs as i64),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs as i64),
        }
    }

    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: Role,
        kind: TokenKind,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            role,
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, and require the expected token kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::Invalid("unexpected token kind".to_string()));
        }

        Ok(data.claims)
    }
}

/// Hex SHA-256 of a token, as stored on the user row
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys("test-secret");
        let token = keys
            .issue(7, "alice", Role::Manager, TokenKind::Access)
            .unwrap();

        let claims = keys.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let keys = keys("test-secret");
        let refresh = keys.issue(1, "bob", Role::User, TokenKind::Refresh).unwrap();

        assert!(matches!(
            keys.verify(&refresh, TokenKind::Access),
            Err(TokenError::Invalid(_))
        ));
        assert!(keys.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys("one").issue(1, "bob", Role::User, TokenKind::Access).unwrap();
        assert!(keys("two").verify(&token, TokenKind::Access).is_err());
        assert!(keys("one").verify("not-a-jwt", TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token() {
        let keys = TokenKeys::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_secs: 0,
            ..AuthConfig::default()
        });
        let token = keys.issue(1, "bob", Role::User, TokenKind::Access).unwrap();
        // exp == iat, so the token is past expiry once a second elapses
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(keys.verify(&token, TokenKind::Access), Err(TokenError::Expired));
    }

    #[test]
    fn test_tokens_are_unique() {
        let keys = keys("test-secret");
        let a = keys.issue(1, "bob", Role::User, TokenKind::Refresh).unwrap();
        let b = keys.issue(1, "bob", Role::User, TokenKind::Refresh).unwrap();
        assert_ne!(a, b);
        assert_ne!(digest(&a), digest(&b));
        assert_eq!(digest(&a).len(), 64);
    }
}
