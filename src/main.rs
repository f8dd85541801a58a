/*****************************************************************************************
 *
 *  DodoTodo – In-memory TODO Microservice in Rust
 *  ----------------------------------------------
 *
 *  VERSION: REST CRUD + WebSocket change feed
 *
 *****************************************************************************************/

mod app;
mod config;
mod errors;
mod routes;
mod services;
mod state;

use tokio::net::TcpListener;
use axum::serve;

use tracing_subscriber::FmtSubscriber;
use tracing::level_filters::LevelFilter;

use crate::config::AppConfig;
use crate::state::app::AppState;
use crate::state::hub::BroadcastHub;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration (TODO_CONFIG, EXE folder, parent, defaults)
    // ────────────────────────────────────────────────────────
    //
    let (cfg, config_path) = match AppConfig::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match &config_path {
        Some(path) => tracing::info!("Loaded config.json from {}", path.display()),
        None => tracing::warn!("No config.json found, using defaults"),
    }

    tracing::info!("Starting DodoTodo…");
    tracing::info!("Loaded configuration: port={} strict_updates={} ws_buffer={}",
        cfg.port, cfg.strict_updates, cfg.ws_buffer);

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app (todos + ws + system routes)
    // ────────────────────────────────────────────────────────
    //
    let port = cfg.port;
    let state = AppState::new(cfg);
    let app = app::build_app(state.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown(state.hub.clone()))
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown(hub: BroadcastHub) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    let closed = hub.close_all();
    tracing::warn!("CTRL+C received, closed {} WebSocket sessions. Goodbye.", closed);
}
