//!
//! todo resource store
//! -------------------
//! Records and the store seam the enforcement point mutates through. The policy engine
//! never reads from here; handlers load `TodoAttrs` snapshots and hand them over.
//!
//! Mutations take the ownership predicate as part of the write (`update_where`,
//! `delete_where`), so a row that changed hands between the policy check and the write
//! is simply not matched.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::{TodoAttrs, TodoStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn attrs(&self) -> TodoAttrs { TodoAttrs::new(self.id.clone(), self.owner_id.clone(), self.status) }
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
}

#[derive(Debug, Clone)]
pub struct TodoChanges {
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
}

/// Storage-level predicate applied together with the id on delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteFilter {
    Any,
    OwnedDraft { owner_id: String },
}

impl DeleteFilter {
    fn matches(&self, todo: &Todo) -> bool {
        match self {
            DeleteFilter::Any => true,
            DeleteFilter::OwnedDraft { owner_id } => &todo.owner_id == owner_id && todo.status == TodoStatus::Draft,
        }
    }
}

pub trait TodoStore: Send + Sync {
    /// Newest `updated_at` first.
    fn list_all(&self) -> Result<Vec<Todo>>;
    fn list_owned(&self, owner_id: &str) -> Result<Vec<Todo>>;
    fn get(&self, id: &str) -> Result<Option<Todo>>;
    fn insert(&self, new: NewTodo) -> Result<Todo>;
    /// Applies `changes` only when the row exists and is owned by `owner_id`.
    fn update_where(&self, id: &str, owner_id: &str, changes: TodoChanges) -> Result<Option<Todo>>;
    /// Returns whether a row matching both the id and `filter` was removed.
    fn delete_where(&self, id: &str, filter: &DeleteFilter) -> Result<bool>;
}

pub type SharedTodoStore = Arc<dyn TodoStore>;

#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    rows: RwLock<HashMap<String, Todo>>,
}

fn newest_first(mut rows: Vec<Todo>) -> Vec<Todo> {
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    rows
}

impl MemoryTodoStore {
    pub fn new() -> Self { Self::default() }

    /// Two todos for Alice (draft, in progress) and a completed one for Bob.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let seed = [
            ("t_seed_1", "u_alice", "Draft: outline project", "Write a short plan and break down tasks.", TodoStatus::Draft),
            ("t_seed_2", "u_alice", "Implement UI skeleton", "App shell, list view, and edit dialog.", TodoStatus::InProgress),
            ("t_seed_3", "u_bob", "Ship MVP", "Finish CRUD flow and validate permissions.", TodoStatus::Completed),
        ];
        let store = Self::new();
        {
            let mut rows = store.rows.write();
            for (id, owner, title, description, status) in seed {
                rows.insert(id.to_string(), Todo {
                    id: id.into(),
                    owner_id: owner.into(),
                    title: title.into(),
                    description: description.into(),
                    status,
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        store
    }
}

impl TodoStore for MemoryTodoStore {
    fn list_all(&self) -> Result<Vec<Todo>> {
        Ok(newest_first(self.rows.read().values().cloned().collect()))
    }

    fn list_owned(&self, owner_id: &str) -> Result<Vec<Todo>> {
        let rows = self.rows.read();
        Ok(newest_first(rows.values().filter(|t| t.owner_id == owner_id).cloned().collect()))
    }

    fn get(&self, id: &str) -> Result<Option<Todo>> { Ok(self.rows.read().get(id).cloned()) }

    fn insert(&self, new: NewTodo) -> Result<Todo> {
        let now = Utc::now();
        let todo = Todo {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().insert(todo.id.clone(), todo.clone());
        debug!(id = %todo.id, owner = %todo.owner_id, "todo.insert");
        Ok(todo)
    }

    fn update_where(&self, id: &str, owner_id: &str, changes: TodoChanges) -> Result<Option<Todo>> {
        let mut rows = self.rows.write();
        let Some(todo) = rows.get_mut(id).filter(|t| t.owner_id == owner_id) else { return Ok(None); };
        todo.title = changes.title;
        todo.description = changes.description;
        todo.status = changes.status;
        todo.updated_at = Utc::now();
        Ok(Some(todo.clone()))
    }

    fn delete_where(&self, id: &str, filter: &DeleteFilter) -> Result<bool> {
        let mut rows = self.rows.write();
        if !rows.get(id).map(|t| filter.matches(t)).unwrap_or(false) { return Ok(false); }
        Ok(rows.remove(id).is_some())
    }
}
