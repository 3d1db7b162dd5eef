//! In-memory employee store
//!
//! Employees live in a flat map keyed by id, with a `manager_id -> reports`
//! index maintained on every write. The store enforces the same constraints
//! the database schema does: a manager reference must resolve and a manager
//! with reports cannot be deleted.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::store::{
    EmployeeChanges, EmployeePage, EmployeeRepository, EmployeeStore, NewEmployee,
    StoreError, StoreResult, StoreTransaction,
};
use super::Employee;

#[derive(Clone, Debug, Default)]
struct Tables {
    employees: BTreeMap<i64, Employee>,
    /// manager id -> ids of direct reports
    reports: BTreeMap<i64, BTreeSet<i64>>,
    last_id: i64,
}

impl Tables {
    fn find_by_id(&self, id: i64) -> Option<Employee> {
        self.employees.get(&id).cloned()
    }

    fn find_by_manager(&self, manager_id: i64) -> Vec<Employee> {
        self.reports
            .get(&manager_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.employees.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list(&self, page: u64, limit: u64) -> EmployeePage {
        let skip = page.saturating_sub(1).saturating_mul(limit) as usize;
        let items = self
            .employees
            .values()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();

        EmployeePage {
            items,
            total: self.employees.len() as u64,
        }
    }

    fn check_manager(&self, manager_id: Option<i64>) -> StoreResult<()> {
        match manager_id {
            Some(id) if !self.employees.contains_key(&id) => Err(StoreError::ForeignKey(
                format!("manager {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }

    fn link(&mut self, manager_id: Option<i64>, id: i64) {
        if let Some(manager_id) = manager_id {
            self.reports.entry(manager_id).or_default().insert(id);
        }
    }

    fn unlink(&mut self, manager_id: Option<i64>, id: i64) {
        if let Some(manager_id) = manager_id {
            if let Some(ids) = self.reports.get_mut(&manager_id) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.reports.remove(&manager_id);
                }
            }
        }
    }

    fn insert(&mut self, new: NewEmployee) -> StoreResult<Employee> {
        self.check_manager(new.manager_id)?;

        self.last_id += 1;
        let now = Utc::now();
        let employee = Employee {
            id: self.last_id,
            name: new.name,
            position: new.position,
            manager_id: new.manager_id,
            created_at: now,
            updated_at: now,
        };

        self.link(employee.manager_id, employee.id);
        self.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    fn update_fields(&mut self, id: i64, changes: EmployeeChanges) -> StoreResult<Option<Employee>> {
        let Some(current) = self.employees.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(manager_id) = changes.manager_id {
            self.check_manager(manager_id)?;
        }

        let mut updated = current.clone();
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(position) = changes.position {
            updated.position = position;
        }
        if let Some(manager_id) = changes.manager_id {
            updated.manager_id = manager_id;
        }
        updated.updated_at = Utc::now();

        if updated.manager_id != current.manager_id {
            self.unlink(current.manager_id, id);
            self.link(updated.manager_id, id);
        }
        self.employees.insert(id, updated.clone());
        Ok(Some(updated))
    }

    fn delete(&mut self, id: i64) -> StoreResult<bool> {
        if self.reports.get(&id).map_or(false, |ids| !ids.is_empty()) {
            return Err(StoreError::ForeignKey(format!(
                "employee {} is still referenced as a manager",
                id
            )));
        }

        match self.employees.remove(&id) {
            Some(removed) => {
                self.unlink(removed.manager_id, id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Employee store backed by process memory
#[derive(Clone, Debug, Default)]
pub struct MemoryEmployeeStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>> {
        Ok(self.tables.read().await.find_by_id(id))
    }

    async fn find_by_manager(&self, manager_id: i64) -> StoreResult<Vec<Employee>> {
        Ok(self.tables.read().await.find_by_manager(manager_id))
    }

    async fn list(&self, page: u64, limit: u64) -> StoreResult<EmployeePage> {
        Ok(self.tables.read().await.list(page, limit))
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        self.tables.write().await.insert(employee)
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        self.tables.write().await.update_fields(id, changes)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.tables.write().await.delete(id)
    }
}

#[async_trait]
impl EmployeeRepository for MemoryEmployeeStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = self.tables.clone().write_owned().await;
        let staged = Mutex::new(Tables::clone(&guard));
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }
}

/// Exclusive transaction over the in-memory tables
///
/// Holds the table write lock until committed or dropped; writes go to a
/// staged copy that replaces the tables on commit.
pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Mutex<Tables>,
}

impl MemoryTransaction {
    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

#[async_trait]
impl EmployeeStore for MemoryTransaction {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Employee>> {
        Ok(self.with_tables(|t| t.find_by_id(id)))
    }

    async fn find_by_manager(&self, manager_id: i64) -> StoreResult<Vec<Employee>> {
        Ok(self.with_tables(|t| t.find_by_manager(manager_id)))
    }

    async fn list(&self, page: u64, limit: u64) -> StoreResult<EmployeePage> {
        Ok(self.with_tables(|t| t.list(page, limit)))
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        self.with_tables(|t| t.insert(employee))
    }

    async fn update_fields(
        &self,
        id: i64,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        self.with_tables(|t| t.update_fields(id, changes))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.with_tables(|t| t.delete(id))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(())
    }
}
