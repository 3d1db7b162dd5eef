//! Authentication middleware
//!
//! Provides bearer-token authentication for API routes

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{AuthError, Principal};
use crate::error::{AppError, AppResult};
use crate::permission::Role;
use crate::state::AppState;

/// Extension to store current user in request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Principal> for CurrentUser {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username,
            role: principal.role,
        }
    }
}

impl CurrentUser {
    /// Fail with 403 unless the user holds one of `roles`
    pub fn require(&self, roles: &[Role]) -> AppResult<()> {
        if self.role.is_any(roles) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.id,
                role = %self.role,
                "Forbidden: role not allowed"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // Only authenticate API routes; everything else is the static dashboard
    if !path.starts_with("/api") {
        return true;
    }

    matches!(
        path,
        "/api/health" | "/api/auth/register" | "/api/auth/login" | "/api/auth/refresh-token"
    )
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return AppError::unauthorized().into_response();
    };

    match state.auth.authenticate(bearer.token()).await {
        Ok(principal) => {
            request
                .extensions_mut()
                .insert(CurrentUser::from(principal));
            next.run(request).await
        }
        Err(AuthError::Token(e)) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::unauthorized().into_response()
        }
        Err(AuthError::UserNotFound | AuthError::InvalidCredentials) => {
            tracing::warn!("Token refers to a missing or invalid account");
            AppError::unauthorized().into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
