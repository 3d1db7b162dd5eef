//! Employee hierarchy
//!
//! The reporting structure is a forest: each employee has at most one
//! manager and following manager links always ends at a root. Everything
//! that writes `manager_id` goes through [`EmployeeService`], which is what
//! keeps that true.

pub mod builder;
pub mod cycle;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod service;
pub mod store;

pub use crate::entity::employee::HierarchicalEmployee;
pub use crate::entity::employee::Model as Employee;
pub use error::{ConflictKind, HierarchyError, HierarchyResult};
pub use memory::MemoryEmployeeStore;
pub use postgres::PostgresEmployeeStore;
pub use service::{EmployeeService, Paginated, SubordinatesView};
pub use store::{EmployeeChanges, EmployeeRepository, EmployeeStore, NewEmployee, StoreError};
