//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Identity},
    ui::state::AppState,
};

use super::event::{Session, dispatch_text};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// `Authorization: Bearer <token>` からトークンを取り出す
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// 認証してから WebSocket にアップグレードする
///
/// トークンがない、または検証に失敗した場合は 401 を返し、アップグレードしない。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(token) = query
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer_token(&headers))
    else {
        tracing::warn!("WebSocket upgrade rejected: missing token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let identity = state.token_verifier.verify(&token).map_err(|e| {
        tracing::warn!("WebSocket upgrade rejected: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    tracing::info!("User '{}' authenticated", identity.user_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: events addressed to this connection
/// (via rx channel) are written to the WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    // 送信チャンネルの登録と presence 通知
    state
        .connect_user_usecase
        .execute(connection_id.clone(), identity.user_id.clone(), tx)
        .await;
    tracing::info!(
        "Connection '{}' opened for user '{}'",
        connection_id,
        identity.user_id
    );

    let (sender, mut receiver) = socket.split();

    let session = Session {
        connection_id: connection_id.clone(),
        identity,
    };
    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    // 1 接続のイベントは受信順に 1 つずつ処理する
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_text(&state_clone, &session, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        session.connection_id
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 退出・presence の後始末（接続ごとに 1 回）
    state.disconnect_user_usecase.execute(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}
