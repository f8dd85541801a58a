use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes::{system_routes, todo_routes, ws_routes};
use crate::state::app::AppState;

/// Build the complete Axum application:
/// - /todos    (REST CRUD)
/// - /ws       (live change notifications)
/// - /system   (alive, version, stats)
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(todo_routes::routes(state.clone()))
        .merge(ws_routes::routes(state.hub.clone()))
        .nest("/system", system_routes::routes(state))
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
