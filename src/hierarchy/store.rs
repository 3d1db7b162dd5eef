//! Employee persistence port
//!
//! The lifecycle service only talks to storage through these traits, so the
//! same rules run against PostgreSQL and the in-memory store.

use async_trait::async_trait;

use super::Employee;
pub use crate::db::{StoreError, StoreResult};

/// Fields of a new employee row; ids and timestamps are assigned by the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub position: String,
    pub manager_id: Option<i64>,
}

/// Partial update of an employee row
///
/// `manager_id`: `None` keeps the current manager, `Some(None)` detaches the
/// employee, `Some(Some(id))` reassigns it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub position: Option<String>,
    pub manager_id: Option<Option<i64>>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none() && self.manager_id.is_none()
    }
}

/// One page of employees ordered by id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    pub total: u64,
}

/// Row-level employee storage
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>>;

    /// Direct reports of `manager_id`, ordered by id
    async fn find_by_manager(&self, manager_id: i64) -> StoreResult<Vec<Employee>>;

    /// `page` is 1-based
    async fn list(&self, page: u64, limit: u64) -> StoreResult<EmployeePage>;

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee>;

    /// Returns `None` when the row does not exist
    async fn update_fields(&self, id: i64, changes: EmployeeChanges)
        -> StoreResult<Option<Employee>>;

    /// Returns `false` when the row does not exist
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// A unit of work over the employee table
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait StoreTransaction: EmployeeStore {
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Employee storage that can open transactions
#[async_trait]
pub trait EmployeeRepository: EmployeeStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}
