use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TodoError};

/// Largest page `list` will ever return.
pub const MAX_LIMIT: usize = 10;

/// A single TODO record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub completed: bool,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT,
        }
    }
}

impl Page {
    /// Build a page from raw query values. Missing values take defaults,
    /// negative values are rejected and `limit` is capped at [`MAX_LIMIT`].
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Result<Self> {
        let offset = match offset {
            None => 0,
            Some(o) if o < 0 => {
                return Err(TodoError::InvalidParameter(format!(
                    "offset must be >= 0, got {o}"
                )))
            }
            Some(o) => usize::try_from(o).unwrap_or(usize::MAX),
        };

        let limit = match limit {
            None => MAX_LIMIT,
            Some(l) if l < 0 => {
                return Err(TodoError::InvalidParameter(format!(
                    "limit must be >= 0, got {l}"
                )))
            }
            Some(l) => usize::try_from(l).unwrap_or(usize::MAX).min(MAX_LIMIT),
        };

        Ok(Self { offset, limit })
    }
}

/// In-memory TODO store shared across the app.
///
/// Records are kept in creation order. Every operation runs under a single
/// `RwLock`, so readers never see a half-applied mutation. Lookups are linear,
/// which is fine for the sizes this service deals with.
#[derive(Clone, Default)]
pub struct TodoStore {
    inner: Arc<RwLock<Vec<Todo>>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Todo>>> {
        self.inner
            .read()
            .map_err(|_| TodoError::Internal("todo store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Todo>>> {
        self.inner
            .write()
            .map_err(|_| TodoError::Internal("todo store lock poisoned".into()))
    }

    pub fn list(&self, page: Page) -> Result<Vec<Todo>> {
        let todos = self.read()?;
        Ok(todos
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    pub fn create(&self, todo: Todo) -> Result<Todo> {
        let mut todos = self.write()?;

        if todos.iter().any(|t| t.id == todo.id) {
            return Err(TodoError::Conflict(todo.id));
        }

        todos.push(todo.clone());
        Ok(todo)
    }

    /// Overwrite the record addressed by `id` with the body's fields.
    ///
    /// The record keeps `id` as its identity whatever `todo.id` says.
    pub fn replace(&self, id: i64, todo: Todo) -> Result<Todo> {
        let mut todos = self.write()?;

        let slot = todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TodoError::NotFound)?;

        slot.text = todo.text;
        slot.completed = todo.completed;
        Ok(slot.clone())
    }

    pub fn delete(&self, id: i64) -> Result<Todo> {
        let mut todos = self.write()?;

        let pos = todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::NotFound)?;

        Ok(todos.remove(pos))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
