//! Role-based access control
//!
//! Every account carries exactly one role. Routes declare which roles may
//! call them through the slices in [`policy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Whether this role is one of `allowed`
    pub fn is_any(self, allowed: &[Role]) -> bool {
        allowed.contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles allowed on each employee route
pub mod policy {
    use super::Role;

    pub const CREATE_EMPLOYEE: &[Role] = &[Role::Admin];
    pub const LIST_EMPLOYEES: &[Role] = &[Role::Admin, Role::Manager];
    pub const READ_EMPLOYEE: &[Role] = &Role::ALL;
    pub const READ_SUBORDINATES: &[Role] = &[Role::Admin, Role::Manager];
    pub const UPDATE_EMPLOYEE: &[Role] = &[Role::Admin, Role::Manager];
    pub const DELETE_EMPLOYEE: &[Role] = &[Role::Admin];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), r#""manager""#);
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_policy() {
        assert!(Role::Admin.is_any(policy::DELETE_EMPLOYEE));
        assert!(!Role::Manager.is_any(policy::DELETE_EMPLOYEE));
        assert!(Role::Manager.is_any(policy::UPDATE_EMPLOYEE));
        assert!(!Role::User.is_any(policy::READ_SUBORDINATES));
        assert!(Role::User.is_any(policy::READ_EMPLOYEE));
        assert!(!Role::Manager.is_any(policy::CREATE_EMPLOYEE));
    }
}
