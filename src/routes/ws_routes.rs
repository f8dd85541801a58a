use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::state::hub::BroadcastHub;

/// Live change feed. Only `/ws` upgrades; any other path is a plain 404.
pub fn routes(hub: BroadcastHub) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(hub)
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<BroadcastHub>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Pump queued notifications to the client until either side goes away.
///
/// Inbound frames are read only to notice a close; their content is ignored.
async fn handle_socket(socket: WebSocket, hub: BroadcastHub) {
    let (id, mut outbound) = hub.register();
    let (mut sender, mut receiver) = socket.split();
    info!("WebSocket subscriber {} connected", id);

    loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(text) => {
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        debug!("Send to subscriber {} failed: {}", id, e);
                        break;
                    }
                }
                // dropped by the hub (overflow or shutdown)
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Receive from subscriber {} failed: {}", id, e);
                    break;
                }
            },
        }
    }

    hub.unregister(id);
    info!("WebSocket subscriber {} disconnected", id);
}
