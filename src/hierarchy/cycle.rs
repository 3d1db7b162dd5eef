//! Cycle guard for manager reassignment
//!
//! Making an employee report to one of its own descendants would close a
//! loop in the reporting chain. Every reassignment goes through
//! [`would_create_cycle`] before it is written.
//!
//! The descendant scan is O(subtree size) per call and is recomputed from
//! the live store every time. Reassignments are rare, so this is fine at
//! organizational scale; caching the set would reopen the stale-read race
//! the transactional update closes.

use std::collections::{HashSet, VecDeque};

use super::store::{EmployeeStore, StoreResult};

/// Collect the ids of all direct and indirect reports of `employee_id`
pub async fn descendant_ids<S>(store: &S, employee_id: i64) -> StoreResult<HashSet<i64>>
where
    S: EmployeeStore + ?Sized,
{
    let mut descendants = HashSet::new();
    let mut queue = VecDeque::from([employee_id]);

    while let Some(manager_id) = queue.pop_front() {
        for report in store.find_by_manager(manager_id).await? {
            // A corrupted graph could revisit a node; skip it.
            if report.id != employee_id && descendants.insert(report.id) {
                queue.push_back(report.id);
            }
        }
    }

    Ok(descendants)
}

/// Whether making `proposed_manager_id` the manager of `employee_id` would
/// create a cycle
pub async fn would_create_cycle<S>(
    store: &S,
    employee_id: i64,
    proposed_manager_id: i64,
) -> StoreResult<bool>
where
    S: EmployeeStore + ?Sized,
{
    if employee_id == proposed_manager_id {
        return Ok(true);
    }

    let descendants = descendant_ids(store, employee_id).await?;
    Ok(descendants.contains(&proposed_manager_id))
}
