//! Employee lifecycle service
//!
//! Orchestrates create/update/delete against the employee store and keeps
//! the reporting structure a forest: no self-management, no cycles, no
//! dangling manager references, no orphaned reports.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::builder::build_hierarchy;
use super::cycle::would_create_cycle;
use super::error::{ConflictKind, HierarchyError, HierarchyResult};
use super::store::{EmployeeChanges, EmployeeRepository, EmployeeStore, NewEmployee, StoreError};
use super::{Employee, HierarchicalEmployee};

pub const MSG_CREATED: &str = "Employee created successfully";
pub const MSG_LISTED: &str = "Employees fetched successfully";
pub const MSG_FETCHED: &str = "Employee fetched successfully";
pub const MSG_UPDATED: &str = "Employee updated successfully";
pub const MSG_DELETED: &str = "Employee deleted successfully";
pub const MSG_SUBORDINATES: &str = "Subordinates fetched successfully";
pub const MSG_NO_SUBORDINATES: &str = "This employee has no subordinates";

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Org chart below an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubordinatesView {
    pub employee: HierarchicalEmployee,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct EmployeeService {
    repo: Arc<dyn EmployeeRepository>,
}

impl EmployeeService {
    pub fn new(repo: Arc<dyn EmployeeRepository>) -> Self {
        Self { repo }
    }

    /// Create an employee, optionally reporting to an existing manager
    pub async fn create(&self, employee: NewEmployee) -> HierarchyResult<Employee> {
        if let Some(manager_id) = employee.manager_id {
            require_employee(&*self.repo, manager_id, "Error creating employee").await?;
        }

        let created = self
            .repo
            .insert(employee)
            .await
            .map_err(|e| storage_error("Error creating employee", e))?;

        info!(
            employee_id = created.id,
            name = %created.name,
            position = %created.position,
            "Employee created successfully"
        );
        Ok(created)
    }

    /// List employees ordered by id
    ///
    /// `page` starts at 1; `limit` is clamped to `1..=100`. Pages past the
    /// largest representable row offset are clamped to it and come back empty.
    pub async fn find_all(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> HierarchyResult<Paginated<Employee>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).clamp(1, last_addressable_page(limit));

        let result = self
            .repo
            .list(page, limit)
            .await
            .map_err(|e| storage_error("Error fetching employees", e))?;

        Ok(Paginated {
            items: result.items,
            total: result.total,
            page,
            limit,
            total_pages: result.total.div_ceil(limit),
        })
    }

    pub async fn find_one(&self, id: i64) -> HierarchyResult<Employee> {
        require_employee(&*self.repo, id, "Error fetching employee").await
    }

    /// Apply a partial update
    ///
    /// A manager reassignment is validated (self-management, existence,
    /// cycles) and written inside one transaction together with the other
    /// field changes.
    pub async fn update(&self, id: i64, changes: EmployeeChanges) -> HierarchyResult<Employee> {
        let tx = self
            .repo
            .begin()
            .await
            .map_err(|e| storage_error("Error updating employee", e))?;

        let updated = update_in(&*tx, id, changes.clone()).await?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Error updating employee", e))?;

        info!(employee_id = id, updates = ?changes, "Employee updated successfully");
        Ok(updated)
    }

    /// Delete an employee without direct reports
    pub async fn remove(&self, id: i64) -> HierarchyResult<()> {
        let tx = self
            .repo
            .begin()
            .await
            .map_err(|e| storage_error("Error deleting employee", e))?;

        remove_in(&*tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| remove_error(id, e))?;

        info!(employee_id = id, "Employee deleted successfully");
        Ok(())
    }

    /// Org chart rooted at `id`
    pub async fn find_all_subordinates(&self, id: i64) -> HierarchyResult<SubordinatesView> {
        let employee = build_hierarchy(&*self.repo, id)
            .await
            .map_err(|e| storage_error("Error fetching subordinates", e))?
            .ok_or_else(|| {
                warn!(employee_id = id, "Employee not found");
                HierarchyError::NotFound(id)
            })?;

        let message = employee
            .subordinates
            .is_empty()
            .then(|| MSG_NO_SUBORDINATES.to_string());

        Ok(SubordinatesView { employee, message })
    }
}

/// Highest page whose offset `(page - 1) * limit` fits a SQL BIGINT
fn last_addressable_page(limit: u64) -> u64 {
    i64::MAX as u64 / limit
}

async fn update_in<S>(store: &S, id: i64, changes: EmployeeChanges) -> HierarchyResult<Employee>
where
    S: EmployeeStore + ?Sized,
{
    require_employee(store, id, "Error updating employee").await?;

    if let Some(Some(manager_id)) = changes.manager_id {
        if manager_id == id {
            return Err(HierarchyError::SelfManagement);
        }

        require_employee(store, manager_id, "Error updating employee").await?;

        let circular = would_create_cycle(store, id, manager_id)
            .await
            .map_err(|e| storage_error("Error updating employee", e))?;
        if circular {
            warn!(employee_id = id, manager_id, "Rejected circular reassignment");
            return Err(HierarchyError::CircularHierarchy);
        }
    }

    store
        .update_fields(id, changes)
        .await
        .map_err(|e| storage_error("Error updating employee", e))?
        .ok_or(HierarchyError::NotFound(id))
}

async fn remove_in<S>(store: &S, id: i64) -> HierarchyResult<()>
where
    S: EmployeeStore + ?Sized,
{
    require_employee(store, id, "Error deleting employee").await?;

    let reports = store
        .find_by_manager(id)
        .await
        .map_err(|e| storage_error("Error deleting employee", e))?;
    if !reports.is_empty() {
        return Err(HierarchyError::HasSubordinates);
    }

    match store.delete(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(HierarchyError::NotFound(id)),
        Err(e) => Err(remove_error(id, e)),
    }
}

async fn require_employee<S>(
    store: &S,
    id: i64,
    context: &'static str,
) -> HierarchyResult<Employee>
where
    S: EmployeeStore + ?Sized,
{
    match store.find_by_id(id).await {
        Ok(Some(employee)) => Ok(employee),
        Ok(None) => {
            warn!(employee_id = id, "Employee not found");
            Err(HierarchyError::NotFound(id))
        }
        Err(e) => Err(storage_error(context, e)),
    }
}

/// A foreign key violation on delete means a report appeared concurrently
fn remove_error(id: i64, err: StoreError) -> HierarchyError {
    match err {
        StoreError::ForeignKey(detail) => {
            warn!(employee_id = id, %detail, "Delete blocked by a concurrent report");
            HierarchyError::HasSubordinates
        }
        other => storage_error("Error deleting employee", other),
    }
}

fn storage_error(context: &'static str, err: StoreError) -> HierarchyError {
    match err {
        StoreError::Duplicate(detail) => {
            warn!(%detail, "{}", context);
            HierarchyError::StorageConflict(ConflictKind::Duplicate)
        }
        StoreError::ForeignKey(detail) => {
            warn!(%detail, "{}", context);
            HierarchyError::StorageConflict(ConflictKind::MissingReference)
        }
        StoreError::Serialization(detail) => {
            warn!(%detail, "{}", context);
            HierarchyError::StorageConflict(ConflictKind::ConcurrentModification)
        }
        StoreError::Failure(detail) => {
            error!(error = %detail, "{}", context);
            HierarchyError::StorageFailure
        }
    }
}
