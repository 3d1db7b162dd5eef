use sea_orm::sea_query::{IndexCreateStatement, TableCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, RuntimeErr,
    Schema, SqlErr, Statement,
};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{employee, user};

/// Storage-level failures shared by the employee and user stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Duplicate(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKey(String),

    #[error("transaction could not be serialized: {0}")]
    Serialization(String),

    #[error("storage failure: {0}")]
    Failure(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// PostgreSQL SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        let detail = err.to_string();
        match sql_state(&err).as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::Duplicate(detail),
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::ForeignKey(detail),
            Some(SERIALIZATION_FAILURE) => return StoreError::Serialization(detail),
            _ => {}
        }

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Duplicate(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => StoreError::ForeignKey(msg),
            _ => StoreError::Failure(detail),
        }
    }
}

fn sql_state(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return None,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}

/// Initialize database connection and create missing tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .set_schema_search_path("public");

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create tables and indexes from the entity definitions
async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;
    // employees.manager_id references employees.id (ON DELETE RESTRICT)
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(employee::Entity))
        .await?;

    for index in schema.create_index_from_entity(employee::Entity) {
        create_index_if_not_exists(db, backend, index).await?;
    }

    info!("Auto-migration completed successfully");
    Ok(())
}

async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: IndexCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    let sql = backend.build(&stmt);
    db.execute(Statement::from_string(backend, sql.to_string())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    /// Database error carrying only a SQLSTATE
    #[derive(Debug)]
    struct SqlState(&'static str);

    impl fmt::Display for SqlState {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl std::error::Error for SqlState {}

    impl DatabaseError for SqlState {
        fn message(&self) -> &str {
            "database rejected the statement"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> DbErr {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            SqlState(code),
        ))))
    }

    #[test]
    fn test_sql_state_classification() {
        assert!(matches!(
            StoreError::from(db_error("40001")),
            StoreError::Serialization(_)
        ));
        assert!(matches!(
            StoreError::from(db_error("23503")),
            StoreError::ForeignKey(_)
        ));
        assert!(matches!(
            StoreError::from(db_error("23505")),
            StoreError::Duplicate(_)
        ));
        assert!(matches!(
            StoreError::from(db_error("42P01")),
            StoreError::Failure(_)
        ));
    }

    #[test]
    fn test_generic_db_error_is_failure() {
        let err = StoreError::from(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, StoreError::Failure(msg) if msg.contains("boom")));
    }

    #[test]
    fn test_record_not_updated_is_failure() {
        assert!(matches!(
            StoreError::from(DbErr::RecordNotUpdated),
            StoreError::Failure(_)
        ));
    }

    #[test]
    fn test_employee_table_has_self_reference() {
        let schema = Schema::new(DbBackend::Postgres);
        let mut stmt = schema.create_table_from_entity(employee::Entity);
        stmt.if_not_exists();
        let sql = DbBackend::Postgres.build(&stmt).to_string();

        assert!(sql.contains(r#"CREATE TABLE IF NOT EXISTS "employees""#));
        assert!(sql.contains("FOREIGN KEY"));
        assert!(sql.contains(r#"REFERENCES "employees" ("id")"#));
        assert!(sql.contains("ON DELETE RESTRICT"));
    }

    #[test]
    fn test_manager_id_is_indexed() {
        let schema = Schema::new(DbBackend::Postgres);
        let indexes = schema.create_index_from_entity(employee::Entity);
        assert_eq!(indexes.len(), 1);

        let sql = DbBackend::Postgres.build(&indexes[0]).to_string();
        assert!(sql.contains(r#""manager_id""#));
    }
}
