use thiserror::Error;

/// Failures of the employee lifecycle operations
///
/// The display text of each variant is shown to API clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The employee or the referenced manager does not exist
    #[error("Employee not found")]
    NotFound(i64),

    #[error("An employee cannot be their own manager")]
    SelfManagement,

    #[error("Cannot assign a subordinate as manager (circular hierarchy)")]
    CircularHierarchy,

    #[error("Cannot delete employee with subordinates. Please reassign subordinates first.")]
    HasSubordinates,

    /// Uniqueness, referential-integrity or serialization conflict
    #[error("{}", .0.message())]
    StorageConflict(ConflictKind),

    #[error("Internal server error")]
    StorageFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Duplicate,
    MissingReference,
    ConcurrentModification,
}

impl ConflictKind {
    pub fn message(self) -> &'static str {
        match self {
            ConflictKind::Duplicate => "Employee already exists",
            ConflictKind::MissingReference => "Referenced employee does not exist",
            ConflictKind::ConcurrentModification => {
                "Concurrent modification detected, please retry"
            }
        }
    }
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_do_not_leak_ids() {
        assert_eq!(HierarchyError::NotFound(42).to_string(), "Employee not found");
        assert_eq!(
            HierarchyError::StorageConflict(ConflictKind::Duplicate).to_string(),
            "Employee already exists"
        );
        assert_eq!(HierarchyError::StorageFailure.to_string(), "Internal server error");
    }
}
