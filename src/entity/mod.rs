//! Entity module - SeaORM entity definitions
//!
//! One module per database table

pub mod employee;
pub mod user;
