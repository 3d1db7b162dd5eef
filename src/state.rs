use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{AuthService, MemoryUserStore, PostgresUserStore, UserStore};
use crate::config::Config;
use crate::hierarchy::{
    EmployeeRepository, EmployeeService, MemoryEmployeeStore, PostgresEmployeeStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    pub employees: EmployeeService,
    pub auth: AuthService,
}

impl AppState {
    /// Create application state over the given stores
    pub fn new(
        config: Config,
        employees: Arc<dyn EmployeeRepository>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let auth = AuthService::new(users, &config.auth);

        Self {
            config: Arc::new(config),
            employees: EmployeeService::new(employees),
            auth,
        }
    }

    /// State backed by PostgreSQL
    pub fn with_database(config: Config, db: DatabaseConnection) -> Self {
        let db = Arc::new(db);
        Self::new(
            config,
            Arc::new(PostgresEmployeeStore::new(db.clone())),
            Arc::new(PostgresUserStore::new(db)),
        )
    }

    /// State backed by process memory
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            config,
            Arc::new(MemoryEmployeeStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }
}
