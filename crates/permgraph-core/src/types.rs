//! Core types for change notification.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// What kind of change a [`PermissionChanged`] event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    /// Roles were added.
    Add,
    /// Roles were removed.
    Remove,
    /// Roles were replaced wholesale, or everything was cleared.
    Reset,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Add => "add",
            PermissionAction::Remove => "remove",
            PermissionAction::Reset => "reset",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered to listeners after a mutation commits.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "S: Serialize, O: Serialize, R: Serialize + Eq + Hash"))]
pub struct PermissionChanged<S, O, R> {
    pub action: PermissionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<O>,
    /// Roles that were removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_roles: Option<HashSet<R>>,
    /// Roles that were added, or the replacement set for a reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_roles: Option<HashSet<R>>,
}

impl<S, O, R> PermissionChanged<S, O, R> {
    pub fn added(subject: S, object: O, roles: HashSet<R>) -> Self {
        Self {
            action: PermissionAction::Add,
            subject: Some(subject),
            object: Some(object),
            old_roles: None,
            new_roles: Some(roles),
        }
    }

    pub fn removed(subject: S, object: O, roles: HashSet<R>) -> Self {
        Self {
            action: PermissionAction::Remove,
            subject: Some(subject),
            object: Some(object),
            old_roles: Some(roles),
            new_roles: None,
        }
    }

    /// Every role of `subject` on every object was dropped.
    pub fn subject_removed(subject: S) -> Self {
        Self {
            action: PermissionAction::Remove,
            subject: Some(subject),
            object: None,
            old_roles: None,
            new_roles: None,
        }
    }

    /// Every role on `object`, for every subject, was dropped.
    pub fn object_removed(object: O) -> Self {
        Self {
            action: PermissionAction::Remove,
            subject: None,
            object: Some(object),
            old_roles: None,
            new_roles: None,
        }
    }

    pub fn reset(subject: S, object: O, roles: HashSet<R>) -> Self {
        Self {
            action: PermissionAction::Reset,
            subject: Some(subject),
            object: Some(object),
            old_roles: None,
            new_roles: Some(roles),
        }
    }

    pub fn cleared() -> Self {
        Self {
            action: PermissionAction::Reset,
            subject: None,
            object: None,
            old_roles: None,
            new_roles: None,
        }
    }

    /// A reset with no subject or object: the whole store was cleared.
    pub fn is_clear(&self) -> bool {
        self.action == PermissionAction::Reset && self.subject.is_none() && self.object.is_none()
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
