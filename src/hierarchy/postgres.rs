//! SeaORM-backed employee store
//!
//! Mutating lifecycle operations run in `SERIALIZABLE` transactions, so a
//! cycle check and the manager write it guards cannot interleave with a
//! concurrent reassignment. The loser of such a race fails with SQLSTATE
//! 40001, surfaced as [`StoreError::Serialization`].

use async_trait::async_trait;
use chrono::Utc;
use std::ops::Deref;
use std::sync::Arc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::store::{
    EmployeeChanges, EmployeePage, EmployeeRepository, EmployeeStore, NewEmployee,
    StoreResult, StoreTransaction,
};
use super::Employee;
use crate::entity::employee;

/// Employee store over a shared SeaORM connection or an open transaction
#[derive(Clone, Debug)]
pub struct PostgresEmployeeStore<C = Arc<DatabaseConnection>> {
    conn: C,
}

impl PostgresEmployeeStore {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> EmployeeStore for PostgresEmployeeStore<C>
where
    C: Deref + Send + Sync,
    C::Target: ConnectionTrait + Send + Sync + Sized,
{
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>> {
        Ok(employee::Entity::find_by_id(id).one(&*self.conn).await?)
    }

    async fn find_by_manager(&self, manager_id: i64) -> StoreResult<Vec<Employee>> {
        Ok(employee::Entity::find()
            .filter(employee::Column::ManagerId.eq(manager_id))
            .order_by_asc(employee::Column::Id)
            .all(&*self.conn)
            .await?)
    }

    async fn list(&self, page: u64, limit: u64) -> StoreResult<EmployeePage> {
        let paginator = employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .paginate(&*self.conn, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(EmployeePage { items, total })
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let now = Utc::now();
        let model = employee::ActiveModel {
            name: Set(employee.name),
            position: Set(employee.position),
            manager_id: Set(employee.manager_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&*self.conn).await?)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let Some(current) = employee::Entity::find_by_id(id).one(&*self.conn).await? else {
            return Ok(None);
        };

        let mut model: employee::ActiveModel = current.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(position) = changes.position {
            model.position = Set(position);
        }
        if let Some(manager_id) = changes.manager_id {
            model.manager_id = Set(manager_id);
        }
        model.updated_at = Set(Utc::now());

        Ok(Some(model.update(&*self.conn).await?))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = employee::Entity::delete_by_id(id).exec(&*self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeStore<Arc<DatabaseConnection>> {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let txn = self
            .conn
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        Ok(Box::new(PostgresEmployeeStore {
            conn: Box::new(txn),
        }))
    }
}

#[async_trait]
impl StoreTransaction for PostgresEmployeeStore<Box<DatabaseTransaction>> {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let store = *self;
        let txn = *store.conn;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(id: i64, manager_id: Option<i64>) -> Employee {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Employee {
            id,
            name: format!("Employee {}", id),
            position: "Engineer".to_string(),
            manager_id,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[tokio::test]
    async fn test_find_by_manager_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(2, Some(1)), row(3, Some(1))]])
            .into_connection();
        let store = PostgresEmployeeStore::new(Arc::new(db));

        let reports = store.find_by_manager(1).await.unwrap();
        let ids: Vec<i64> = reports.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(reports.iter().all(|e| e.manager_id == Some(1)));
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let store = PostgresEmployeeStore::new(Arc::new(db));

        assert!(!store.delete(4).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Employee>::new()])
            .into_connection();
        let store = PostgresEmployeeStore::new(Arc::new(db));

        let result = store.update_fields(9, EmployeeChanges::default()).await.unwrap();
        assert!(result.is_none());
    }
}
