use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::CorsConfig;
use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// CORS policy: explicit origins get credentials, an empty list allows any
/// origin without them
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .route("/auth/logout", post(handlers::auth::logout))
        // Employee routes
        .route(
            "/employees",
            post(handlers::employee::create_employee).get(handlers::employee::list_employees),
        )
        .route(
            "/employees/:id",
            get(handlers::employee::get_employee)
                .patch(handlers::employee::update_employee)
                .delete(handlers::employee::delete_employee),
        )
        .route(
            "/employees/:id/subordinates",
            get(handlers::employee::get_subordinates),
        );

    // Static dashboard, falls back to index.html for SPA routing
    let static_dir = &state.config.static_dir;
    let serve_dir =
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
