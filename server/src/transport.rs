//! HTTP front: websocket upgrades on `/ws`, static files for everything else.
//!
//! Each upgraded socket is split in two. The read half feeds a session; the
//! write half is owned by a writer task that drains the connection's outbound
//! queue, so a slow client only ever delays its own frames.

use crate::error::ServerError;
use crate::relay::RelayHandle;
use crate::session::run_session;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{future, SinkExt, StreamExt};
use log::{debug, error, info};
use shared::ServerMessage;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::services::ServeDir;

/// Builds the router: `/ws` for players, `directory` served at the root.
pub fn router(relay: RelayHandle, directory: &Path) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .fallback_service(ServeDir::new(directory))
        .with_state(relay)
}

/// Serves connections until the listener fails.
pub async fn serve(
    listener: TcpListener,
    relay: RelayHandle,
    directory: &Path,
) -> Result<(), ServerError> {
    if !directory.is_dir() {
        return Err(ServerError::MissingDirectory {
            path: directory.to_path_buf(),
        });
    }

    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}/ serving {}", addr, directory.display());
    }

    let app = router(relay, directory);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|source| ServerError::Serve { source })
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(relay): State<RelayHandle>,
) -> impl IntoResponse {
    debug!("Upgrading connection from {}", addr);
    ws.on_upgrade(move |socket| connection(socket, addr, relay))
}

async fn connection(socket: WebSocket, addr: SocketAddr, relay: RelayHandle) {
    let (mut sink, stream) = socket.split();
    let (outbox, mut queue) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode message for {}: {}", addr, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                error!("Failed to write to {}: {}", addr, e);
                break;
            }
        }
    });

    // Text and binary frames carry payloads; a close frame ends the stream.
    let inbound = stream
        .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });

    run_session(Box::pin(inbound), addr.port(), relay, outbox).await;

    // The relay drops its sender when the leave is applied, which ends the writer.
    if let Err(e) = writer.await {
        error!("Writer task for {} panicked: {}", addr, e);
    }
    debug!("Connection from {} finished", addr);
}
