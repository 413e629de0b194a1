//! Visibility rules for video listing, detail and streaming.
//!
//! Deployments differ on how much of the archive an ordinary user may see,
//! so both knobs are configuration rather than hard-coded behaviour. The
//! defaults reproduce an open, trusted-network setup: every authenticated
//! caller sees every video and streams need no token.

use std::str::FromStr;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Which videos list/detail endpoints expose to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Every non-deleted video, whoever uploaded it.
    #[default]
    All,
    /// Ordinary users see only their own uploads; managers and supervisors
    /// still see everything.
    Own,
}

impl FromStr for ListScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ListScope::All),
            "own" => Ok(ListScope::Own),
            other => Err(CoreError::Validation(format!(
                "Invalid video list scope '{other}'. Must be one of: all, own"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoAccessPolicy {
    pub list_scope: ListScope,
    pub stream_requires_auth: bool,
}

impl VideoAccessPolicy {
    /// Uploader filter to apply for `caller`, or `None` for no filter.
    pub fn uploader_filter(&self, caller_id: DbId, caller_role: Role) -> Option<DbId> {
        match self.list_scope {
            ListScope::All => None,
            ListScope::Own if caller_role.is_elevated() => None,
            ListScope::Own => Some(caller_id),
        }
    }
}
