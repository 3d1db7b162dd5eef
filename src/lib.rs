//! Employee Hierarchy - org-chart management service
//!
//! This crate provides employee records arranged in a reporting hierarchy,
//! the rules that keep that hierarchy a forest, and a JWT-protected HTTP API
//! over it.

pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod middleware;
pub mod permission;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
