use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use serde::Deserialize;

use crate::errors::{Result, TodoError};
use crate::services::{todo_service, validation};
use crate::state::app::AppState;
use crate::state::todos::{Page, Todo};

/// Build the /todos routes.
///
/// Auth is checked inside the DELETE handler only, so a bad content type on
/// POST/PUT is always answered with 415 regardless of credentials.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/:id", put(replace_todo).delete(delete_todo))
        .with_state(state)
}

/// Raw query values; empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

fn parse_param(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| TodoError::InvalidParameter(format!("{name} must be an integer"))),
    }
}

/// A non-numeric id can never name a todo.
fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| TodoError::NotFound)
}

//
// ─────────────────────────────────────────────────────────────
// GET /todos?offset=&limit=
// ─────────────────────────────────────────────────────────────
//
async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Todo>>> {
    let page = Page::new(
        parse_param("offset", params.offset.as_deref())?,
        parse_param("limit", params.limit.as_deref())?,
    )?;

    Ok(Json(todo_service::list(&state.store, page)?))
}

//
// ─────────────────────────────────────────────────────────────
// POST /todos
// ─────────────────────────────────────────────────────────────
//
async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Todo>)> {
    validation::require_json(&headers)?;
    let todo = validation::for_create(&body)?;

    let created = todo_service::create(&state.store, &state.hub, todo)?;
    Ok((StatusCode::CREATED, Json(created)))
}

//
// ─────────────────────────────────────────────────────────────
// PUT /todos/{id}
// ─────────────────────────────────────────────────────────────
//
async fn replace_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Todo>> {
    validation::require_json(&headers)?;
    let id = parse_id(&raw_id)?;
    let todo = validation::for_replace(id, &body, state.config.strict_updates)?;

    let updated = todo_service::replace(&state.store, &state.hub, id, todo)?;
    Ok(Json(updated))
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /todos/{id}   (basic auth)
// ─────────────────────────────────────────────────────────────
//
async fn delete_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
) -> Result<StatusCode> {
    let id = parse_id(&raw_id)?;
    authorize(&state, auth)?;

    todo_service::delete(&state.store, &state.hub, id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn authorize(state: &AppState, auth: Option<TypedHeader<Authorization<Basic>>>) -> Result<()> {
    let TypedHeader(Authorization(basic)) = auth.ok_or(TodoError::Unauthorized)?;

    if basic.username() == state.config.admin_user
        && basic.password() == state.config.admin_password
    {
        Ok(())
    } else {
        tracing::warn!("Rejected delete for user {:?}", basic.username());
        Err(TodoError::Unauthorized)
    }
}
