//! Request handlers module

pub mod auth;
pub mod employee;
