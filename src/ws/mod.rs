use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::broadcast::outbound_channel;
use crate::manager::SessionHandle;
use crate::protocol::ClientMessage;

/// Routes: the WebSocket upgrade at `/` (where the clients connect) and `/ws`
pub fn router(session: SessionHandle) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(session): State<SessionHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, session))
}

/// Pump one connection: inbound frames go to the session manager, the
/// manager's outbound queue goes to the socket.
async fn handle_socket(socket: WebSocket, session: SessionHandle) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut outbound) = outbound_channel();
    let connection_id = session.connect(tx);

    tracing::debug!("WebSocket connected: {}", connection_id);

    loop {
        tokio::select! {
            server_msg = outbound.recv() => {
                let Some(msg) = server_msg else {
                    break;
                };
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if let Err(e) = sender.send(Message::Text(json.into())).await {
                            tracing::warn!("Send to {} failed: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => tracing::error!("Failed to serialize {:?}: {}", msg, e),
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received from {}: {}", connection_id, text.as_str());
                        if let Some(client_msg) = ClientMessage::parse(text.as_str()) {
                            session.dispatch(&connection_id, client_msg);
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("WebSocket {} closed by client", connection_id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error on {}: {}", connection_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    session.disconnect(&connection_id);
    tracing::debug!("WebSocket connection {} finished", connection_id);
}
