//! Rules composed from `decide` that callers need: the list gate, delete ordering, and
//! advisory affordances for presentation. Server and client-side views both go through
//! here; only the server's enforcement is authoritative.

use serde::Serialize;
use tracing::debug;

use crate::identity::{AuthContext, Privilege};

use super::evaluator::decide;
use super::model::{Action, Decision, Denial, TodoAttrs};

/// Privileges that imply access to one's own part of the list.
pub const OWNER_SCOPED: [Privilege; 5] = [
    Privilege::TodoViewOwn,
    Privilege::TodoCreateOwn,
    Privilege::TodoUpdateOwn,
    Privilege::TodoDeleteOwnDraft,
    Privilege::TodoDeleteAny,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Owned(String),
}

impl ListScope {
    pub fn includes(&self, todo: &TodoAttrs) -> bool {
        match self {
            ListScope::All => true,
            ListScope::Owned(owner) => &todo.owner_id == owner,
        }
    }
}

/// Which delete rule granted the request; selects the storage-level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteGrant {
    Any,
    OwnDraft,
}

/// Advisory flags for rendering. Never a substitute for server-side enforcement.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Affordances {
    pub view: bool,
    pub update: bool,
    pub delete: bool,
}

/// Enforcement entry point: the engine's verdict, traced at debug level.
pub fn authorize(ctx: &AuthContext, action: Action, todo: Option<&TodoAttrs>) -> Decision {
    let decision = decide(ctx, action, todo);
    debug!(
        user = %ctx.user.id,
        %action,
        todo = todo.map(|t| t.id.as_str()),
        allowed = decision.allowed,
        reason = decision.reason.as_deref(),
        "policy.decision"
    );
    decision
}

/// The "can I see the todos page at all" gate. Broader than the per-item view rule:
/// any owner-scoped privilege reaches the caller's own todos.
pub fn list_scope(ctx: &AuthContext) -> Result<ListScope, Decision> {
    if decide(ctx, Action::ViewAll, None).allowed {
        return Ok(ListScope::All);
    }
    if ctx.has_any(&OWNER_SCOPED) {
        return Ok(ListScope::Owned(ctx.user.id.clone()));
    }
    Err(Decision::deny(Denial::NoListAccess))
}

/// `delete_any` first; `delete_own_draft` is only consulted when that is denied, and its
/// reason is the one reported.
pub fn authorize_delete(ctx: &AuthContext, todo: &TodoAttrs) -> Result<DeleteGrant, Decision> {
    if decide(ctx, Action::DeleteAny, Some(todo)).allowed {
        return Ok(DeleteGrant::Any);
    }
    let own = decide(ctx, Action::DeleteOwnDraft, Some(todo));
    if own.allowed { Ok(DeleteGrant::OwnDraft) } else { Err(own) }
}

/// Per-item visibility: everything with view:all, otherwise own todos with view:own.
pub fn can_view(ctx: &AuthContext, todo: &TodoAttrs) -> Decision {
    let all = decide(ctx, Action::ViewAll, Some(todo));
    if all.allowed { all } else { decide(ctx, Action::ViewOwn, Some(todo)) }
}

pub fn affordances(ctx: &AuthContext, todo: &TodoAttrs) -> Affordances {
    Affordances {
        view: can_view(ctx, todo).allowed,
        update: decide(ctx, Action::UpdateOwn, Some(todo)).allowed,
        delete: authorize_delete(ctx, todo).is_ok(),
    }
}

/// Client-side filtering of an already fetched list with the server's list rule.
pub fn visible<'a, T, F>(ctx: &AuthContext, items: &'a [T], attrs: F) -> Vec<&'a T>
where
    F: Fn(&T) -> TodoAttrs,
{
    match list_scope(ctx) {
        Ok(scope) => items.iter().filter(|item| scope.includes(&attrs(*item))).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthUser;
    use crate::policy::TodoStatus;

    fn ctx(id: &str, privileges: &[Privilege]) -> AuthContext {
        let user = AuthUser { id: id.into(), name: id.into(), email: None };
        AuthContext::new(user, Vec::new(), privileges.iter().copied())
    }

    #[test]
    fn authorize_returns_the_engine_verdict() {
        let bob = ctx("u_bob", &[Privilege::TodoUpdateOwn, Privilege::TodoDeleteOwnDraft]);
        let todos = [TodoAttrs::new("t1", "u_bob", TodoStatus::Draft), TodoAttrs::new("t2", "u_alice", TodoStatus::Completed)];
        for action in Action::ALL {
            assert_eq!(authorize(&bob, action, None), decide(&bob, action, None));
            for t in &todos {
                assert_eq!(authorize(&bob, action, Some(t)), decide(&bob, action, Some(t)));
            }
        }
    }

    #[test]
    fn list_gate_is_broader_than_item_view() {
        // delete:any alone reaches the (own) list even without any view grant
        let admin = ctx("u_admin", &[Privilege::TodoDeleteAny]);
        assert_eq!(list_scope(&admin), Ok(ListScope::Owned("u_admin".into())));
        let own = TodoAttrs::new("t", "u_admin", TodoStatus::Draft);
        assert!(!can_view(&admin, &own).allowed);

        let manager = ctx("u_mgr", &[Privilege::TodoViewAll]);
        assert_eq!(list_scope(&manager), Ok(ListScope::All));

        let err = list_scope(&ctx("u_none", &[])).unwrap_err();
        assert_eq!(err.denial, Some(Denial::NoListAccess));
        assert_eq!(err.reason.as_deref(), Some("Missing privilege (todo:view:all or todo:view:own)"));
    }

    #[test]
    fn delete_any_short_circuits_status_and_ownership() {
        let t = TodoAttrs::new("t", "u_bob", TodoStatus::InProgress);
        let both = ctx("u_ada", &[Privilege::TodoDeleteAny, Privilege::TodoDeleteOwnDraft]);
        assert_eq!(authorize_delete(&both, &t), Ok(DeleteGrant::Any));

        let plain = ctx("u_bob", &[Privilege::TodoDeleteOwnDraft]);
        let err = authorize_delete(&plain, &t).unwrap_err();
        assert_eq!(err.denial, Some(Denial::NotDraft));
        let draft = TodoAttrs::new("t", "u_bob", TodoStatus::Draft);
        assert_eq!(authorize_delete(&plain, &draft), Ok(DeleteGrant::OwnDraft));
    }

    #[test]
    fn affordances_follow_the_rule_table() {
        let alice = ctx("u_alice", &[Privilege::TodoCreateOwn, Privilege::TodoUpdateOwn, Privilege::TodoDeleteOwnDraft]);
        let mine = TodoAttrs::new("t1", "u_alice", TodoStatus::Draft);
        let theirs = TodoAttrs::new("t3", "u_bob", TodoStatus::Completed);
        assert_eq!(affordances(&alice, &mine), Affordances { view: false, update: true, delete: true });
        assert_eq!(affordances(&alice, &theirs), Affordances::default());
    }

    #[test]
    fn visible_filters_by_list_scope() {
        let todos = vec![
            TodoAttrs::new("t1", "u_alice", TodoStatus::Draft),
            TodoAttrs::new("t2", "u_bob", TodoStatus::Draft),
        ];
        let alice = ctx("u_alice", &[Privilege::TodoCreateOwn]);
        let seen: Vec<&str> = visible(&alice, &todos, |t| t.clone()).into_iter().map(|t| t.id.as_str()).collect();
        assert_eq!(seen, vec!["t1"]);
        let mona = ctx("u_mona", &[Privilege::TodoViewAll]);
        assert_eq!(visible(&mona, &todos, |t| t.clone()).len(), 2);
        assert!(visible(&ctx("x", &[]), &todos, |t| t.clone()).is_empty());
    }
}
