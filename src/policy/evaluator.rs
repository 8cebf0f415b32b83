//! The rule table. Pure and total: no I/O, no state, one decision per input.
//! Checks run in a fixed order and the first failing check's reason is returned.

use crate::identity::{AuthContext, Privilege};

use super::model::{Action, Decision, Denial, Operation, TodoAttrs, TodoStatus};

pub fn decide(ctx: &AuthContext, action: Action, todo: Option<&TodoAttrs>) -> Decision {
    let required = action.required_privilege();
    if !ctx.has(required) {
        return Decision::deny(Denial::MissingPrivilege(required));
    }
    let checked = match action {
        Action::ViewAll | Action::CreateOwn | Action::DeleteAny => Ok(()),
        // List-level view needs no resource; a specific todo is checked for ownership
        // unless the caller could see everything anyway.
        Action::ViewOwn => match todo {
            Some(t) if !ctx.has(Privilege::TodoViewAll) => owned_by_caller(ctx, t, Operation::View),
            _ => Ok(()),
        },
        Action::UpdateOwn => present(todo).and_then(|t| owned_by_caller(ctx, t, Operation::Update)),
        Action::DeleteOwnDraft => present(todo).and_then(|t| {
            owned_by_caller(ctx, t, Operation::Delete)?;
            in_draft(t)
        }),
    };
    match checked {
        Ok(()) => Decision::allow(),
        Err(denial) => Decision::deny(denial),
    }
}

fn present(todo: Option<&TodoAttrs>) -> Result<&TodoAttrs, Denial> {
    todo.ok_or(Denial::MissingTodo)
}

fn owned_by_caller(ctx: &AuthContext, todo: &TodoAttrs, op: Operation) -> Result<(), Denial> {
    if ctx.owns(&todo.owner_id) { Ok(()) } else { Err(Denial::NotOwner(op)) }
}

fn in_draft(todo: &TodoAttrs) -> Result<(), Denial> {
    if todo.status == TodoStatus::Draft { Ok(()) } else { Err(Denial::NotDraft) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthUser;

    fn ctx(id: &str, privileges: &[Privilege]) -> AuthContext {
        let user = AuthUser { id: id.into(), name: id.into(), email: None };
        AuthContext::new(user, Vec::new(), privileges.iter().copied())
    }

    fn todo(owner: &str, status: TodoStatus) -> TodoAttrs { TodoAttrs::new("t1", owner, status) }

    #[test]
    fn privilege_only_actions_ignore_the_resource() {
        let full = ctx("u1", &Privilege::ALL);
        let foreign = todo("u2", TodoStatus::Completed);
        for action in [Action::ViewAll, Action::CreateOwn, Action::DeleteAny] {
            assert!(decide(&full, action, None).allowed, "{action}");
            assert!(decide(&full, action, Some(&foreign)).allowed, "{action}");
        }
    }

    #[test]
    fn missing_privilege_is_reported_by_key() {
        let nobody = ctx("u1", &[]);
        for action in Action::ALL {
            let d = decide(&nobody, action, Some(&todo("u1", TodoStatus::Draft)));
            assert!(!d.allowed);
            assert_eq!(d.denial, Some(Denial::MissingPrivilege(action.required_privilege())));
            assert_eq!(d.reason.unwrap(), format!("Missing privilege {}", action.required_privilege().key()));
        }
    }

    #[test]
    fn view_own_checks_ownership_only_when_a_todo_is_given() {
        let viewer = ctx("u1", &[Privilege::TodoViewOwn]);
        assert!(decide(&viewer, Action::ViewOwn, None).allowed);
        assert!(decide(&viewer, Action::ViewOwn, Some(&todo("u1", TodoStatus::Draft))).allowed);
        let d = decide(&viewer, Action::ViewOwn, Some(&todo("u2", TodoStatus::Draft)));
        assert_eq!(d.denial, Some(Denial::NotOwner(Operation::View)));

        let broad = ctx("u1", &[Privilege::TodoViewOwn, Privilege::TodoViewAll]);
        assert!(decide(&broad, Action::ViewOwn, Some(&todo("u2", TodoStatus::Draft))).allowed);
    }

    #[test]
    fn update_own_requires_todo_then_ownership() {
        let editor = ctx("u1", &[Privilege::TodoUpdateOwn]);
        let d = decide(&editor, Action::UpdateOwn, None);
        assert_eq!(d.reason.as_deref(), Some("Missing todo context."));
        let d = decide(&editor, Action::UpdateOwn, Some(&todo("u2", TodoStatus::Draft)));
        assert_eq!(d.reason.as_deref(), Some("Can only update your own todos."));
        for status in TodoStatus::ALL {
            assert!(decide(&editor, Action::UpdateOwn, Some(&todo("u1", status))).allowed);
        }
    }

    #[test]
    fn delete_own_draft_checks_in_order() {
        let user = ctx("u1", &[Privilege::TodoDeleteOwnDraft]);
        assert_eq!(decide(&user, Action::DeleteOwnDraft, None).denial, Some(Denial::MissingTodo));
        // foreign and not draft: ownership is reported first
        let d = decide(&user, Action::DeleteOwnDraft, Some(&todo("u2", TodoStatus::Completed)));
        assert_eq!(d.reason.as_deref(), Some("Can only delete your own todos."));
        let d = decide(&user, Action::DeleteOwnDraft, Some(&todo("u1", TodoStatus::InProgress)));
        assert_eq!(d.reason.as_deref(), Some("Can only delete todos in \"draft\" status."));
        assert!(decide(&user, Action::DeleteOwnDraft, Some(&todo("u1", TodoStatus::Draft))).allowed);
    }

    #[test]
    fn allowed_decisions_carry_no_reason() {
        let full = ctx("u1", &Privilege::ALL);
        let own = todo("u1", TodoStatus::Draft);
        for action in Action::ALL {
            let d = decide(&full, action, Some(&own));
            assert!(d.allowed);
            assert!(d.reason.is_none() && d.denial.is_none());
        }
    }
}
