use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;

use crate::error::{ListingError, UploadError};
use crate::listing::files_status;
use crate::models::{ConnectedPayload, FileStatus, ServerEvent, UploadQuery, UploadResponse};
use crate::state::AppState;
use crate::upload::UploadSession;

/// body of every request no route claims
pub const DEFAULT_BODY: &str = "hello world";

// stream every file of a multipart body to disk, reporting progress to the session's socket
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, UploadError> {
    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Upload request without sessionId");
            UploadError::MissingSessionId
        })?;

    if !state.notifier.is_connected(&session_id) {
        tracing::debug!("Session {} has no realtime connection, progress will be dropped", session_id);
    }

    let mut session = UploadSession::new(
        state.files_dir.clone(),
        session_id,
        state.notifier.clone(),
        state.message_time_delay,
    );
    let summary = session.begin(&headers, body.into_data_stream()).await?;

    tracing::info!(
        "Request finished with success! {} file(s), {} bytes",
        summary.files.len(),
        summary.total_bytes()
    );
    Ok(Json(UploadResponse::success()))
}

// list uploaded files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileStatus>>, ListingError> {
    let files = files_status(&state.files_dir, &state.file_owner).await?;
    Ok(Json(files))
}

// cors preflight
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn default_route() -> &'static str {
    DEFAULT_BODY
}

// anything outside the mapped routes; preflight still answers 204
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight().await.into_response();
    }
    default_route().await.into_response()
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SocketQuery {
    pub session_id: Option<String>,
}

// realtime channel; the connection's session id is what uploads pass as `sessionId`
pub async fn socket(
    ws: WebSocketUpgrade,
    Query(query): Query<SocketQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.session_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, requested: Option<String>) {
    let (session_id, mut events) = match requested.filter(|id| !id.is_empty()) {
        Some(id) => {
            let rx = state.notifier.register_with(id.clone());
            (id, rx)
        }
        None => state.notifier.register(),
    };
    tracing::info!("someone connected {}", session_id);

    let (mut ws_tx, mut ws_rx) = socket.split();

    let connected = ServerEvent::Connected(ConnectedPayload {
        session_id: session_id.clone(),
    });
    if send_event(&mut ws_tx, &connected).await.is_ok() {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            if send_event(&mut ws_tx, &event).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue, // client frames carry nothing
                    }
                }
            }
        }
    }

    state.notifier.unregister(&session_id, events);
    tracing::info!("{} disconnected", session_id);
}

async fn send_event(
    tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).map_err(axum::Error::new)?;
    tx.send(Message::Text(text)).await
}
