use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Privilege;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewAll,
    ViewOwn,
    CreateOwn,
    UpdateOwn,
    DeleteAny,
    DeleteOwnDraft,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl Action {
    pub const ALL: [Action; 6] = [
        Action::ViewAll,
        Action::ViewOwn,
        Action::CreateOwn,
        Action::UpdateOwn,
        Action::DeleteAny,
        Action::DeleteOwnDraft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewAll => "view_all",
            Action::ViewOwn => "view_own",
            Action::CreateOwn => "create_own",
            Action::UpdateOwn => "update_own",
            Action::DeleteAny => "delete_any",
            Action::DeleteOwnDraft => "delete_own_draft",
        }
    }

    /// The single privilege gating this action; checked before any resource attribute.
    pub fn required_privilege(self) -> Privilege {
        match self {
            Action::ViewAll => Privilege::TodoViewAll,
            Action::ViewOwn => Privilege::TodoViewOwn,
            Action::CreateOwn => Privilege::TodoCreateOwn,
            Action::UpdateOwn => Privilege::TodoUpdateOwn,
            Action::DeleteAny => Privilege::TodoDeleteAny,
            Action::DeleteOwnDraft => Privilege::TodoDeleteOwnDraft,
        }
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL.into_iter().find(|a| a.as_str() == s).ok_or_else(|| UnknownAction(s.to_string()))
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Lifecycle status. Any authorized update may move a todo to any status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [TodoStatus::Draft, TodoStatus::InProgress, TodoStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Draft => "draft",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

impl Display for TodoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// The resource attributes the engine reads. Callers load them; the engine never does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TodoAttrs {
    pub id: String,
    pub owner_id: String,
    pub status: TodoStatus,
}

impl TodoAttrs {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, status: TodoStatus) -> Self {
        Self { id: id.into(), owner_id: owner_id.into(), status }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation { View, Update, Delete }

/// Which rule branch denied. Callers that need to categorize a denial match on this
/// rather than on the reason text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    MissingPrivilege(Privilege),
    /// List gate: neither view:all nor any per-owner privilege.
    NoListAccess,
    MissingTodo,
    NotOwner(Operation),
    NotDraft,
}

impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::MissingPrivilege(p) => write!(f, "Missing privilege {}", p),
            Denial::NoListAccess => write!(f, "Missing privilege ({} or {})", Privilege::TodoViewAll, Privilege::TodoViewOwn),
            Denial::MissingTodo => f.write_str("Missing todo context."),
            Denial::NotOwner(Operation::View) => f.write_str("Can only view your own todos."),
            Denial::NotOwner(Operation::Update) => f.write_str("Can only update your own todos."),
            Denial::NotOwner(Operation::Delete) => f.write_str("Can only delete your own todos."),
            Denial::NotDraft => f.write_str("Can only delete todos in \"draft\" status."),
        }
    }
}

/// Verdict of the engine. `reason` is set exactly when `allowed` is false. Only built
/// through `allow`/`deny`, never read back from the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip)]
    pub denial: Option<Denial>,
}

impl Decision {
    pub fn allow() -> Self { Self { allowed: true, reason: None, denial: None } }

    pub fn deny(denial: Denial) -> Self {
        Self { allowed: false, reason: Some(denial.to_string()), denial: Some(denial) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_wire_shape_carries_reason_only_on_deny() {
        let v = serde_json::to_value(Decision::allow()).unwrap();
        assert_eq!(v, serde_json::json!({ "allowed": true }));
        let v = serde_json::to_value(Decision::deny(Denial::NotDraft)).unwrap();
        assert_eq!(v, serde_json::json!({ "allowed": false, "reason": "Can only delete todos in \"draft\" status." }));
    }
}
