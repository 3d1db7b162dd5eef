//! Authentication handlers
//!
//! Implements register, login, token refresh and logout endpoints

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::auth::service::{MSG_LOGGED_IN, MSG_LOGGED_OUT};
use crate::auth::TokenPair;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::permission::Role;
use crate::routes::ApiResponse;
use crate::state::AppState;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Register request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RegisterRequest {
    fn validate(&self) -> AppResult<()> {
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::Validation(format!(
                "username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    req.validate()?;
    let pair = state
        .auth
        .register(&req.username, &req.password, req.role)
        .await?;
    Ok(Json(ApiResponse::success(MSG_LOGGED_IN, pair)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let pair = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::success(MSG_LOGGED_IN, pair)))
}

/// POST /api/auth/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let pair = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::success(MSG_LOGGED_IN, pair)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth.logout(user.id).await?;
    Ok(Json(ApiResponse::success_msg(MSG_LOGGED_OUT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults_to_user_role() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice","password":"secret1"}"#).unwrap();
        assert_eq!(req.role, Role::User);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_validation() {
        let short_name = RegisterRequest {
            username: "al".to_string(),
            password: "secret1".to_string(),
            role: Role::User,
        };
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            username: "alice".to_string(),
            password: "12345".to_string(),
            role: Role::User,
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_register_rejects_unknown_role() {
        let result: Result<RegisterRequest, _> =
            serde_json::from_str(r#"{"username":"alice","password":"secret1","role":"root"}"#);
        assert!(result.is_err());
    }
}
