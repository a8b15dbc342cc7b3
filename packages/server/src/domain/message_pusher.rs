//! MessagePusher trait 定義
//!
//! UseCase 層は解決済みの接続 ID 集合に対してイベントを渡すだけで、
//! 送信手段（WebSocket など）には依存しない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, event::OutboundEvent, value_object::ConnectionId};

/// 接続ごとの送信チャンネル（シリアライズ済みのテキストフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを削除（未登録なら何もしない）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 1 接続へ送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 指定した接続群へ送信。個別の送信失敗は許容する
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 全接続へ送信
    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError>;
}
