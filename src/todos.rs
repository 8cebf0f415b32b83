//! Server-side enforcement point for todo operations.
//!
//! Every mutation is decided by the policy engine first and then written with a
//! storage-level ownership filter. When the filter matches nothing although the policy
//! allowed the request, the request is refused as forbidden: the policy decision is the
//! authority, the filter only closes the gap between check and write.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::identity::AuthContext;
use crate::policy::{self, Action, Affordances, DeleteGrant, ListScope, TodoStatus};
use crate::storage::{DeleteFilter, NewTodo, SharedTodoStore, Todo, TodoChanges};

pub const TITLE_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TodoStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TodoStatus,
}

fn validate(title: &str, description: &str) -> AppResult<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::user("bad_request", "title must not be empty"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::user("bad_request".to_string(), format!("title exceeds {} characters", TITLE_MAX_CHARS)));
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::user("bad_request".to_string(), format!("description exceeds {} characters", DESCRIPTION_MAX_CHARS)));
    }
    Ok((title.to_string(), description.trim().to_string()))
}

#[derive(Clone)]
pub struct TodoService {
    store: SharedTodoStore,
}

impl TodoService {
    pub fn new(store: SharedTodoStore) -> Self { Self { store } }

    pub fn list(&self, ctx: &AuthContext) -> AppResult<Vec<Todo>> {
        let scope = policy::list_scope(ctx).map_err(|d| AppError::denied(&d))?;
        let rows = match &scope {
            ListScope::All => self.store.list_all()?,
            ListScope::Owned(owner) => self.store.list_owned(owner)?,
        };
        debug!(user = %ctx.user.id, ?scope, count = rows.len(), "todo.list");
        Ok(rows)
    }

    pub fn get(&self, ctx: &AuthContext, id: &str) -> AppResult<(Todo, Affordances)> {
        let todo = self.load(id)?;
        let attrs = todo.attrs();
        let decision = policy::can_view(ctx, &attrs);
        if !decision.allowed {
            return Err(AppError::denied(&decision));
        }
        Ok((todo, policy::affordances(ctx, &attrs)))
    }

    /// The create gate on its own, so callers can refuse before reading a request body.
    pub fn ensure_can_create(&self, ctx: &AuthContext) -> AppResult<()> {
        let decision = policy::authorize(ctx, Action::CreateOwn, None);
        if decision.allowed { Ok(()) } else { Err(AppError::denied(&decision)) }
    }

    pub fn create(&self, ctx: &AuthContext, input: CreateTodo) -> AppResult<Todo> {
        self.ensure_can_create(ctx)?;
        let (title, description) = validate(&input.title, &input.description)?;
        let todo = self.store.insert(NewTodo { owner_id: ctx.user.id.clone(), title, description, status: input.status })?;
        debug!(user = %ctx.user.id, id = %todo.id, "todo.create");
        Ok(todo)
    }

    pub fn update(&self, ctx: &AuthContext, id: &str, input: UpdateTodo) -> AppResult<Todo> {
        let (title, description) = validate(&input.title, &input.description)?;
        let existing = self.load(id)?;
        let decision = policy::authorize(ctx, Action::UpdateOwn, Some(&existing.attrs()));
        if !decision.allowed {
            return Err(AppError::denied(&decision));
        }
        let changes = TodoChanges { title, description, status: input.status };
        match self.store.update_where(id, &ctx.user.id, changes)? {
            Some(todo) => Ok(todo),
            None => {
                warn!(user = %ctx.user.id, id, "todo.update matched no owned row after policy allow");
                Err(AppError::forbidden("forbidden", "Forbidden"))
            }
        }
    }

    pub fn delete(&self, ctx: &AuthContext, id: &str) -> AppResult<()> {
        let existing = self.load(id)?;
        let grant = policy::authorize_delete(ctx, &existing.attrs()).map_err(|d| {
            debug!(user = %ctx.user.id, id, reason = ?d.reason, "todo.delete denied");
            AppError::denied(&d)
        })?;
        let filter = match grant {
            DeleteGrant::Any => DeleteFilter::Any,
            DeleteGrant::OwnDraft => DeleteFilter::OwnedDraft { owner_id: ctx.user.id.clone() },
        };
        if self.store.delete_where(id, &filter)? {
            debug!(user = %ctx.user.id, id, ?grant, "todo.delete");
            return Ok(());
        }
        warn!(user = %ctx.user.id, id, ?grant, "todo.delete matched no row after policy allow");
        Err(AppError::forbidden("forbidden", "Forbidden"))
    }

    fn load(&self, id: &str) -> AppResult<Todo> {
        self.store.get(id)?.ok_or_else(|| AppError::not_found("not_found", "Not Found"))
    }
}
