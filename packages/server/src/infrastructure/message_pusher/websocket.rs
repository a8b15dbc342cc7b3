//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - ドメインイベントをワイヤ形式（JSON テキスト）に変換して送信（push_to, broadcast, broadcast_all）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! チャンネルへの送信はブロックしないため、ロックを保持したまま送信しても I/O 待ちは発生しません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel},
    infrastructure::dto::websocket::ServerEvent,
};

/// ドメインイベントをテキストフレームにシリアライズ
fn encode(event: &OutboundEvent) -> Result<String, MessagePushError> {
    let wire = ServerEvent::from(event.clone());
    serde_json::to_string(&wire).map_err(|e| MessagePushError::Serialization(e.to_string()))
}

/// WebSocket を使った MessagePusher 実装
///
/// ## フィールド
///
/// - `channels`: 接続 ID と対応する送信チャンネルのマップ
#[derive(Default)]
pub struct WebSocketMessagePusher {
    channels: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut channels = self.channels.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        channels.insert(connection_id, sender);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        if channels.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let content = encode(event)?;
        let channels = self.channels.lock().await;

        let sender = channels
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!(
            "Pushed '{}' to connection '{}'",
            event.name(),
            connection_id
        );
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let content = encode(event)?;
        let channels = self.channels.lock().await;

        for target in targets {
            match channels.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.clone()) {
                        tracing::warn!("Failed to push '{}' to '{}': {}", event.name(), target, e);
                    } else {
                        tracing::debug!("Broadcasted '{}' to '{}'", event.name(), target);
                    }
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }

    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError> {
        let content = encode(event)?;
        let channels = self.channels.lock().await;

        for (connection_id, sender) in channels.iter() {
            if let Err(e) = sender.send(content.clone()) {
                tracing::warn!(
                    "Failed to push '{}' to '{}': {}",
                    event.name(),
                    connection_id,
                    e
                );
            }
        }
        tracing::debug!(
            "Broadcasted '{}' to {} connection(s)",
            event.name(),
            channels.len()
        );

        Ok(())
    }
}
