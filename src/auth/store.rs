//! User account storage

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::entity::user;
use crate::db::{StoreError, StoreResult};
use crate::permission::Role;

pub type User = user::Model;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    /// bcrypt hash
    pub password: String,
    pub role: Role,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Duplicate`] when the username is taken
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    /// Replace the stored refresh-token digest; returns false for an
    /// unknown user
    async fn set_refresh_token(&self, id: i64, digest: Option<String>) -> StoreResult<bool>;
}

#[derive(Clone, Debug)]
pub struct PostgresUserStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresUserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(user::Entity::find_by_id(id).one(&*self.db).await?)
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let model = user::ActiveModel {
            username: Set(new.username),
            password: Set(new.password),
            role: Set(new.role.as_str().to_string()),
            refresh_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&*self.db).await?)
    }

    async fn set_refresh_token(&self, id: i64, digest: Option<String>) -> StoreResult<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::RefreshToken, Expr::value(digest))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

/// Users kept in process memory
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Duplicate(format!(
                "username {} already exists",
                new.username
            )));
        }

        let id = users.keys().next_back().map_or(1, |last| last + 1);
        let now = Utc::now();
        let user = User {
            id,
            username: new.username,
            password: new.password,
            role: new.role.as_str().to_string(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        users.insert(id, user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, id: i64, digest: Option<String>) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token = digest;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_memory_insert_and_find() {
        let store = MemoryUserStore::new();
        let alice = store.insert(new_user("alice")).await.unwrap();
        let bob = store.insert(new_user("bob")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(alice.role, "user");
        assert_eq!(store.find_by_username("bob").await.unwrap(), Some(bob));
        assert_eq!(store.find_by_id(1).await.unwrap(), Some(alice));
        assert_eq!(store.find_by_username("carol").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_duplicate_username() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice")).await.unwrap();

        assert!(matches!(
            store.insert(new_user("alice")).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_refresh_token() {
        let store = MemoryUserStore::new();
        let alice = store.insert(new_user("alice")).await.unwrap();

        assert!(store
            .set_refresh_token(alice.id, Some("abc".to_string()))
            .await
            .unwrap());
        let stored = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("abc"));

        assert!(store.set_refresh_token(alice.id, None).await.unwrap());
        assert!(!store.set_refresh_token(99, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_postgres_find_by_username() {
        let now = Utc::now();
        let row = User {
            id: 3,
            username: "alice".to_string(),
            password: "hash".to_string(),
            role: "admin".to_string(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection();

        let store = PostgresUserStore::new(Arc::new(db));
        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(row));
    }
}
