//! Org-chart construction
//!
//! Walks the live store from a root employee and assembles the subtree of
//! its direct and indirect reports.
//!
//! Precondition: the manager graph is a forest. The walk carries no depth
//! bound or visited set, so a cycle written behind the lifecycle service's
//! back makes it recurse forever.

use futures::future::{try_join_all, BoxFuture, FutureExt};

use super::store::{EmployeeStore, StoreResult};
use super::{Employee, HierarchicalEmployee};

/// Build the org chart rooted at `employee_id`
///
/// Returns `None` when no such employee exists.
pub async fn build_hierarchy<S>(
    store: &S,
    employee_id: i64,
) -> StoreResult<Option<HierarchicalEmployee>>
where
    S: EmployeeStore + ?Sized,
{
    let Some(employee) = store.find_by_id(employee_id).await? else {
        return Ok(None);
    };

    expand(store, employee).await.map(Some)
}

/// Resolve `employee`, then recurse into each direct report.
///
/// Sibling subtrees are fetched concurrently; `try_join_all` keeps them in
/// the store's id order.
pub fn expand<'a, S>(
    store: &'a S,
    employee: Employee,
) -> BoxFuture<'a, StoreResult<HierarchicalEmployee>>
where
    S: EmployeeStore + ?Sized,
{
    async move {
        let reports = store.find_by_manager(employee.id).await?;
        let subordinates = try_join_all(reports.into_iter().map(|report| expand(store, report)))
            .await?;

        Ok(HierarchicalEmployee::new(employee, subordinates))
    }
    .boxed()
}
