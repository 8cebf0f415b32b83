//! Decision engine properties and the demo-user scenarios.
//! Privilege sets are enumerated exhaustively (all 64 subsets) rather than sampled.

use todo_abac::identity::{AuthContext, AuthUser, Privilege};
use todo_abac::policy::{self, decide, Action, Denial, TodoAttrs, TodoStatus};

fn ctx(id: &str, privileges: impl IntoIterator<Item = Privilege>) -> AuthContext {
    let user = AuthUser { id: id.into(), name: id.into(), email: None };
    AuthContext::new(user, vec!["test".to_string()], privileges)
}

fn every_privilege_subset() -> Vec<Vec<Privilege>> {
    (0u32..(1 << Privilege::ALL.len()))
        .map(|mask| Privilege::ALL.iter().enumerate().filter(|(i, _)| mask & (1 << i) != 0).map(|(_, p)| *p).collect())
        .collect()
}

fn todos_for(owner: &str) -> Vec<TodoAttrs> {
    TodoStatus::ALL.iter().map(|s| TodoAttrs::new(format!("t_{}_{}", owner, s), owner, *s)).collect()
}

#[test]
fn update_own_never_allows_foreign_todos() {
    for privileges in every_privilege_subset() {
        let u = ctx("u_1", privileges.clone());
        for t in todos_for("u_2") {
            let d = decide(&u, Action::UpdateOwn, Some(&t));
            assert!(!d.allowed, "update of foreign todo allowed with {:?}", privileges);
        }
    }
}

#[test]
fn delete_any_allows_every_todo() {
    for privileges in every_privilege_subset().into_iter().filter(|s| s.contains(&Privilege::TodoDeleteAny)) {
        let u = ctx("u_1", privileges);
        for t in todos_for("u_1").into_iter().chain(todos_for("u_2")) {
            assert!(decide(&u, Action::DeleteAny, Some(&t)).allowed);
            assert!(decide(&u, Action::DeleteAny, None).allowed);
            assert_eq!(policy::authorize_delete(&u, &t), Ok(policy::DeleteGrant::Any));
        }
    }
}

#[test]
fn own_draft_delete_depends_only_on_status() {
    let subsets = every_privilege_subset()
        .into_iter()
        .filter(|s| s.contains(&Privilege::TodoDeleteOwnDraft) && !s.contains(&Privilege::TodoDeleteAny));
    for privileges in subsets {
        let u = ctx("u_1", privileges);
        for t in todos_for("u_1") {
            let d = decide(&u, Action::DeleteOwnDraft, Some(&t));
            assert_eq!(d.allowed, t.status == TodoStatus::Draft);
            if !d.allowed {
                assert!(d.reason.as_deref().unwrap_or_default().contains("status"));
                assert_eq!(d.denial, Some(Denial::NotDraft));
            }
            assert_eq!(policy::authorize_delete(&u, &t).is_ok(), t.status == TodoStatus::Draft);
        }
    }
}

#[test]
fn reason_present_exactly_when_denied() {
    let statuses = TodoStatus::ALL;
    for privileges in every_privilege_subset() {
        let u = ctx("u_1", privileges);
        for action in Action::ALL {
            let mut resources: Vec<Option<TodoAttrs>> = vec![None];
            for owner in ["u_1", "u_2"] {
                resources.extend(statuses.iter().map(|s| Some(TodoAttrs::new("t", owner, *s))));
            }
            for r in resources.iter() {
                let d = decide(&u, action, r.as_ref());
                assert_eq!(d.allowed, d.reason.is_none(), "{action} {:?}", r);
                assert_eq!(d.allowed, d.denial.is_none());
                // idempotent
                assert_eq!(d, decide(&u, action, r.as_ref()));
            }
        }
    }
}

#[test]
fn missing_privilege_is_checked_before_resource_attributes() {
    let u = ctx("u_1", [Privilege::TodoViewAll]);
    let d = decide(&u, Action::DeleteOwnDraft, None);
    assert_eq!(d.denial, Some(Denial::MissingPrivilege(Privilege::TodoDeleteOwnDraft)));
    let d = decide(&u, Action::UpdateOwn, None);
    assert_eq!(d.reason.as_deref(), Some("Missing privilege todo:update:own"));
}

#[test]
fn roles_play_no_part_in_decisions() {
    let user = AuthUser { id: "u_1".into(), name: "One".into(), email: None };
    let with_admin_role = AuthContext::new(user.clone(), vec!["admin".to_string()], []);
    let t = TodoAttrs::new("t", "u_2", TodoStatus::Completed);
    for action in Action::ALL {
        assert!(!decide(&with_admin_role, action, Some(&t)).allowed);
    }
}

#[test]
fn scenario_alice_deletes_her_draft_until_it_is_completed() {
    let alice = ctx("u_alice", [Privilege::TodoCreateOwn, Privilege::TodoUpdateOwn, Privilege::TodoDeleteOwnDraft]);
    assert!(decide(&alice, Action::CreateOwn, None).allowed);
    let mut t1 = TodoAttrs::new("t1", "u_alice", TodoStatus::Draft);
    assert!(decide(&alice, Action::DeleteOwnDraft, Some(&t1)).allowed);

    t1.status = TodoStatus::Completed;
    let d = decide(&alice, Action::DeleteOwnDraft, Some(&t1));
    assert!(!d.allowed);
    assert!(d.reason.unwrap().contains("draft"));
}

#[test]
fn scenario_manager_cannot_update_even_own_todos() {
    let mona = ctx("u_mona", [Privilege::TodoViewAll]);
    for owner in ["u_alice", "u_mona"] {
        let t1 = TodoAttrs::new("t1", owner, TodoStatus::Draft);
        let d = decide(&mona, Action::UpdateOwn, Some(&t1));
        assert!(!d.allowed);
        assert!(d.reason.unwrap().contains("Missing privilege"));
    }
    assert_eq!(policy::list_scope(&mona), Ok(policy::ListScope::All));
}

#[test]
fn scenario_admin_deletes_bobs_in_progress_todo() {
    let ada = ctx("u_ada", [Privilege::TodoDeleteAny]);
    let t = TodoAttrs::new("t_bob", "u_bob", TodoStatus::InProgress);
    assert!(decide(&ada, Action::DeleteAny, Some(&t)).allowed);
    assert_eq!(policy::authorize_delete(&ada, &t), Ok(policy::DeleteGrant::Any));
    // the restricted rule alone would have refused
    assert!(!decide(&ada, Action::DeleteOwnDraft, Some(&t)).allowed);
}

#[test]
fn actions_parse_from_wire_names_only() {
    for action in Action::ALL {
        assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
    }
    assert!("delete".parse::<Action>().is_err());
    let a: Action = serde_json::from_str("\"delete_own_draft\"").unwrap();
    assert_eq!(a, Action::DeleteOwnDraft);
}
