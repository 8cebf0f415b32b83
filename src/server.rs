//!
//! todo-abac HTTP server
//! ---------------------
//! Thin Axum glue around the authorization core.
//!
//! Responsibilities:
//! - Demo login (by user id or email) issuing opaque bearer sessions.
//! - Resolving the bearer's subject into an `AuthContext` on every request.
//! - Mapping todo endpoints onto `TodoService`, which enforces the policy.
//!
//! Status mapping: no/invalid bearer or unknown subject -> 401, policy denial -> 403 with
//! the decision's reason, lookup timeout or store failure -> 503.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthContext, DemoDirectory, PrivilegeResolver, ResolveError, SessionManager};
use crate::storage::{MemoryTodoStore, SharedTodoStore};
use crate::todos::{CreateTodo, TodoService, UpdateTodo};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: PrivilegeResolver,
    pub sessions: SessionManager,
    pub todos: TodoService,
}

impl AppState {
    pub fn new(resolver: PrivilegeResolver, sessions: SessionManager, store: SharedTodoStore) -> Self {
        Self { resolver, sessions, todos: TodoService::new(store) }
    }

    /// In-memory directory and store, seeded with demo data when configured.
    pub fn in_memory(cfg: &ServerConfig) -> Self {
        let directory = Arc::new(if cfg.seed_demo { DemoDirectory::seeded() } else { DemoDirectory::new() });
        let store: SharedTodoStore = Arc::new(if cfg.seed_demo { MemoryTodoStore::seeded() } else { MemoryTodoStore::new() });
        let resolver = PrivilegeResolver::new(directory.clone(), directory).with_timeout(cfg.lookup_timeout);
        Self::new(resolver, SessionManager::new(cfg.session_ttl), store)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "ok": true })) }))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", get(get_todo).patch(update_todo).delete(delete_todo))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await.context("http server terminated")
}

/// Start the HTTP server with in-memory collaborators.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg.bind_addr()?;
    let state = AppState::in_memory(&cfg);
    info!(
        "Starting server on {} (seed_demo={}, lookup_timeout_ms={}, session_ttl_secs={})",
        addr,
        cfg.seed_demo,
        cfg.lookup_timeout.as_millis(),
        cfg.session_ttl.as_secs()
    );
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;
    serve(listener, state).await
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme != "Bearer" || token.is_empty() { return None; }
    Some(token)
}

/// Unwraps a body only after the caller is authenticated; rejections become 400s.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(v)| v).map_err(|rejection| AppError::user("bad_request".to_string(), rejection.body_text()))
}

async fn auth_context(state: &AppState, headers: &HeaderMap) -> AppResult<AuthContext> {
    let token = bearer_token(headers).ok_or_else(|| AppError::auth("unauthorized", "Missing Authorization Bearer token"))?;
    let user_id = state.sessions.validate(token).ok_or_else(|| AppError::auth("unauthorized", "Invalid token"))?;
    Ok(state.resolver.resolve(&user_id).await?)
}

async fn login(State(state): State<AppState>, body: Result<Json<LoginPayload>, JsonRejection>) -> AppResult<impl IntoResponse> {
    let payload = json_body(body)?;
    let resolved = match (payload.user_id.as_deref(), payload.email.as_deref()) {
        (Some(id), _) => state.resolver.resolve(id).await,
        (None, Some(email)) => state.resolver.resolve_by_email(email).await,
        (None, None) => return Err(AppError::user("bad_request", "user_id or email is required")),
    };
    let ctx = resolved.map_err(|e| match e {
        ResolveError::NotFound(_) => AppError::auth("unauthorized", "Invalid credentials"),
        other => AppError::from(other),
    })?;
    let session = state.sessions.issue(&ctx.user.id)?;
    info!(user = %ctx.user.id, "auth.login");
    Ok(Json(json!({ "token": session.token, "session": ctx })))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers).ok_or_else(|| AppError::auth("unauthorized", "Missing Authorization Bearer token"))?;
    let removed = state.sessions.logout(token);
    Ok(Json(json!({ "ok": removed })))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    Ok(Json(json!({ "session": ctx })))
}

async fn list_todos(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    let todos = state.todos.list(&ctx)?;
    Ok(Json(json!({ "todos": todos })))
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateTodo>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    state.todos.ensure_can_create(&ctx)?;
    let todo = state.todos.create(&ctx, json_body(body)?)?;
    Ok((StatusCode::CREATED, Json(json!({ "todo": todo }))))
}

async fn get_todo(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    let (todo, permissions) = state.todos.get(&ctx, &id)?;
    Ok(Json(json!({ "todo": todo, "permissions": permissions })))
}

async fn update_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateTodo>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    let todo = state.todos.update(&ctx, &id, json_body(body)?)?;
    Ok(Json(json!({ "todo": todo })))
}

async fn delete_todo(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let ctx = auth_context(&state, &headers).await?;
    state.todos.delete(&ctx, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
