//! Account registration, login and token rotation

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::store::{NewUser, User, UserStore};
use super::token::{digest, TokenError, TokenKeys, TokenKind, TokenPair};
use crate::config::AuthConfig;
use crate::db::StoreError;
use crate::permission::Role;

pub const MSG_LOGGED_IN: &str = "User logged in successfully";
pub const MSG_LOGGED_OUT: &str = "Logged out successfully";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username already exist")]
    UsernameTaken,

    #[error("Unauthorized access")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AuthError::UsernameTaken,
            other => AuthError::Storage(other),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// The account behind a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: TokenKeys,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            keys: TokenKeys::new(config),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> AuthResult<TokenPair> {
        if self.users.find_by_username(username).await?.is_some() {
            warn!(username, "Registration failed: Username already exists");
            return Err(AuthError::UsernameTaken);
        }

        let hashed = bcrypt::hash(password, self.bcrypt_cost)?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                password: hashed,
                role,
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Duplicate(_)) {
                    warn!(username, "Registration failed: Username already exists");
                } else {
                    error!(username, error = %e, "Error during registration");
                }
                AuthError::from(e)
            })?;

        info!(user_id = user.id, username, role = %role, "User registered");
        self.issue_tokens(&user, role).await
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthResult<TokenPair> {
        let user = match self.validate_user(username, password).await? {
            Some(user) => user,
            None => {
                warn!(username, "Login failed: Invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let role = parse_role(&user)?;
        self.issue_tokens(&user, role).await
    }

    /// Exchange a refresh token for a new pair
    ///
    /// Only the most recently issued refresh token of a user is accepted;
    /// using it rotates both tokens.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self
            .keys
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(error = %e, "Invalid refresh token");
                AuthError::InvalidRefreshToken
            })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        match user.refresh_token.as_deref() {
            Some(stored) if stored == digest(refresh_token) => {}
            _ => {
                warn!(user_id = user.id, "Refresh token does not match the stored one");
                return Err(AuthError::InvalidRefreshToken);
            }
        }

        let role = parse_role(&user)?;
        self.issue_tokens(&user, role).await
    }

    pub async fn logout(&self, user_id: i64) -> AuthResult<()> {
        if !self.users.set_refresh_token(user_id, None).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id, "User logged out");
        Ok(())
    }

    /// Check a username/password pair
    pub async fn validate_user(&self, username: &str, password: &str) -> AuthResult<Option<User>> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(None);
        };

        let valid = bcrypt::verify(password, &user.password).unwrap_or(false);
        Ok(valid.then_some(user))
    }

    pub async fn validate_user_by_id(&self, user_id: i64) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Resolve a bearer access token to its account
    ///
    /// The role comes from the user store rather than the token, so a role
    /// change or a deleted account takes effect before the token expires.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<Principal> {
        let claims = self.keys.verify(access_token, TokenKind::Access)?;
        let user = self.validate_user_by_id(claims.sub).await?;
        let role = parse_role(&user)?;

        Ok(Principal {
            id: user.id,
            username: user.username,
            role,
        })
    }

    async fn issue_tokens(&self, user: &User, role: Role) -> AuthResult<TokenPair> {
        let access_token = self
            .keys
            .issue(user.id, &user.username, role, TokenKind::Access)?;
        let refresh_token = self
            .keys
            .issue(user.id, &user.username, role, TokenKind::Refresh)?;

        self.users
            .set_refresh_token(user.id, Some(digest(&refresh_token)))
            .await?;

        info!(user_id = user.id, username = %user.username, "{}", MSG_LOGGED_IN);
        Ok(TokenPair {
            access_token,
            refresh_token,
            username: user.username.clone(),
            role,
        })
    }
}

fn parse_role(user: &User) -> AuthResult<Role> {
    user.role.parse().map_err(|e| {
        error!(user_id = user.id, error = %e, "Stored role is not recognized");
        AuthError::InvalidCredentials
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryUserStore;

    fn service() -> (AuthService, MemoryUserStore) {
        let store = MemoryUserStore::new();
        let config = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            bcrypt_cost: 4,
            ..AuthConfig::default()
        };
        (AuthService::new(Arc::new(store.clone()), &config), store)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, store) = service();
        let pair = auth.register("alice", "secret1", Role::Manager).await.unwrap();
        assert_eq!(pair.username, "alice");
        assert_eq!(pair.role, Role::Manager);

        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(user.password, "secret1");
        assert_eq!(user.refresh_token, Some(digest(&pair.refresh_token)));

        let pair = auth.login("alice", "secret1").await.unwrap();
        let principal = auth.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (auth, _) = service();
        auth.register("alice", "secret1", Role::User).await.unwrap();

        let err = auth.register("alice", "other1", Role::Admin).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(err.to_string(), "Username already exist");
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (auth, _) = service();
        auth.register("alice", "secret1", Role::User).await.unwrap();

        assert!(matches!(
            auth.login("alice", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates() {
        let (auth, _) = service();
        let first = auth.register("alice", "secret1", Role::User).await.unwrap();

        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        // The superseded token no longer matches the stored digest
        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(auth.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let (auth, _) = service();
        let pair = auth.register("alice", "secret1", Role::User).await.unwrap();

        assert!(matches!(
            auth.refresh(&pair.access_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(auth.authenticate(&pair.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh() {
        let (auth, _) = service();
        let pair = auth.register("alice", "secret1", Role::User).await.unwrap();
        let principal = auth.authenticate(&pair.access_token).await.unwrap();

        auth.logout(principal.id).await.unwrap();
        assert!(matches!(
            auth.refresh(&pair.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(auth.logout(999).await, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (auth, _) = service();
        let keys = TokenKeys::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        });
        let token = keys.issue(42, "ghost", Role::Admin, TokenKind::Access).unwrap();

        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
