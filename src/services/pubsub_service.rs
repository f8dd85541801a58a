use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::hub::BroadcastHub;
use crate::state::todos::Todo;

/// Change pushed to WebSocket subscribers after a store mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TodoEvent {
    Created { todo: Todo },
    Updated { todo: Todo },
    Deleted { id: i64 },
}

impl TodoEvent {
    fn name(&self) -> &'static str {
        match self {
            TodoEvent::Created { .. } => "created",
            TodoEvent::Updated { .. } => "updated",
            TodoEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Push `event` to every live subscriber. Returns how many sessions got it.
///
/// Only queues frames, so the calling request is never held up by a slow
/// socket.
pub fn notify(hub: &BroadcastHub, event: TodoEvent) -> usize {
    let mut frame = match serde_json::to_value(&event) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("Unexpected {} event shape: {}", event.name(), other);
            return 0;
        }
        Err(e) => {
            warn!("Failed to serialize {} event: {}", event.name(), e);
            return 0;
        }
    };
    frame.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));

    let payload = Value::Object(frame).to_string();

    let delivered = hub.broadcast(&payload);
    debug!("Broadcast {} event to {} subscribers", event.name(), delivered);
    delivered
}
