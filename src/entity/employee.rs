//! Employee entity - employees table
//!
//! Every row points at its direct manager through `manager_id`; rows with a
//! null manager are the roots of the org-chart forest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(255))")]
    pub name: String,

    #[sea_orm(column_type = "String(Some(255))")]
    pub position: String,

    /// Direct manager (None for the top of a reporting chain)
    #[sea_orm(nullable, indexed)]
    pub manager_id: Option<i64>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Deleting a manager that still has reports is rejected by the database.
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ManagerId",
        to = "Column::Id",
        on_delete = "Restrict"
    )]
    Manager,
}

impl ActiveModelBehavior for ActiveModel {}

/// Org-chart node (used for API responses)
///
/// A read-time projection: it is rebuilt from the flat table on every query
/// and never written back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalEmployee {
    #[serde(flatten)]
    pub employee: Model,
    pub subordinates: Vec<HierarchicalEmployee>,
    /// Number of direct and indirect reports
    pub total_subordinates_count: usize,
}

impl HierarchicalEmployee {
    pub fn new(employee: Model, subordinates: Vec<HierarchicalEmployee>) -> Self {
        let total_subordinates_count = subordinates
            .iter()
            .map(|sub| 1 + sub.total_subordinates_count)
            .sum();

        Self {
            employee,
            subordinates,
            total_subordinates_count,
        }
    }

    pub fn id(&self) -> i64 {
        self.employee.id
    }

    /// Number of nodes in this subtree, the root included
    pub fn node_count(&self) -> usize {
        1 + self
            .subordinates
            .iter()
            .map(HierarchicalEmployee::node_count)
            .sum::<usize>()
    }
}

impl From<Model> for HierarchicalEmployee {
    fn from(model: Model) -> Self {
        Self::new(model, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn employee(id: i64, manager_id: Option<i64>) -> Model {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Model {
            id,
            name: format!("Employee {}", id),
            position: "Engineer".to_string(),
            manager_id,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_leaf_has_zero_count() {
        let leaf = HierarchicalEmployee::from(employee(1, None));
        assert_eq!(leaf.total_subordinates_count, 0);
        assert_eq!(leaf.node_count(), 1);
    }

    #[test]
    fn test_count_includes_indirect_reports() {
        let c = HierarchicalEmployee::from(employee(3, Some(2)));
        let b = HierarchicalEmployee::new(employee(2, Some(1)), vec![c]);
        let d = HierarchicalEmployee::from(employee(4, Some(1)));
        let a = HierarchicalEmployee::new(employee(1, None), vec![b, d]);

        assert_eq!(a.total_subordinates_count, 3);
        assert_eq!(a.subordinates[0].total_subordinates_count, 1);
        assert_eq!(a.node_count(), 4);
    }

    #[test]
    fn test_json_shape() {
        let node = HierarchicalEmployee::from(employee(7, Some(1)));
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["managerId"], 1);
        assert_eq!(json["totalSubordinatesCount"], 0);
        assert!(json["subordinates"].as_array().unwrap().is_empty());
        assert!(json.get("createdAt").is_some());
    }
}
