use axum::http::{header, HeaderMap};

use crate::errors::{Result, TodoError};
use crate::state::todos::Todo;

/// Reject bodies that are not declared as JSON.
///
/// Accepts `application/json` and `application/*+json`, with any parameters.
pub fn require_json(headers: &HeaderMap) -> Result<()> {
    let raw = match headers.get(header::CONTENT_TYPE) {
        Some(value) => value
            .to_str()
            .map_err(|_| TodoError::UnsupportedContentType("<non-ascii>".into()))?,
        None => return Err(TodoError::UnsupportedContentType("<missing>".into())),
    };

    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    let is_json = essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"));

    if is_json {
        Ok(())
    } else {
        Err(TodoError::UnsupportedContentType(raw.to_string()))
    }
}

/// Decode `{id, text, completed}` with strict types. Extra fields are ignored.
fn decode(body: &[u8]) -> Result<Todo> {
    serde_json::from_slice::<Todo>(body).map_err(|e| TodoError::InvalidPayload(e.to_string()))
}

pub fn for_create(body: &[u8]) -> Result<Todo> {
    let todo = decode(body)?;

    if todo.text.is_empty() {
        return Err(TodoError::InvalidPayload("text must not be empty".into()));
    }

    Ok(todo)
}

/// Validate a PUT body addressed at `url_id`.
///
/// In lenient mode an empty `text` and a body `id` different from `url_id`
/// both pass; `strict` rejects them.
pub fn for_replace(url_id: i64, body: &[u8], strict: bool) -> Result<Todo> {
    let todo = decode(body)?;

    if strict {
        if todo.text.is_empty() {
            return Err(TodoError::InvalidPayload("text must not be empty".into()));
        }
        if todo.id != url_id {
            return Err(TodoError::InvalidPayload(format!(
                "body id {} does not match path id {}",
                todo.id, url_id
            )));
        }
    }

    Ok(todo)
}
