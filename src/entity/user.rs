//! User entity - users table
//!
//! Accounts that may sign in to the API. Roles are stored as plain strings
//! and parsed through [`crate::permission::Role`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Username (unique)
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub username: String,

    /// Password (bcrypt hash)
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    /// admin / manager / user
    #[sea_orm(column_type = "String(Some(16))")]
    pub role: String,

    /// SHA-256 digest of the last issued refresh token
    #[sea_orm(column_type = "String(Some(64))", nullable)]
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
