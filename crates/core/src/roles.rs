//! Role names and the allow-lists built from them.
//!
//! Roles are stored as lowercase text in `users.role`; the strings here must
//! match the check constraint in the `create_users` migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_USER: &str = "user";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_SUPERVISOR: &str = "supervisor";

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
    Supervisor,
}

/// Roles allowed to manage rooms and users, and to delete any video.
pub const MANAGEMENT_ROLES: &[Role] = &[Role::Manager, Role::Supervisor];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Manager => ROLE_MANAGER,
            Role::Supervisor => ROLE_SUPERVISOR,
        }
    }

    /// Whether this role belongs to [`MANAGEMENT_ROLES`].
    pub fn is_elevated(self) -> bool {
        MANAGEMENT_ROLES.contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_USER => Ok(Role::User),
            ROLE_MANAGER => Ok(Role::Manager),
            ROLE_SUPERVISOR => Ok(Role::Supervisor),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {ROLE_USER}, {ROLE_MANAGER}, {ROLE_SUPERVISOR}"
            ))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
