//! UseCase: ユーザー切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() メソッド
//! - Room からの退出、Registry からの削除、オフライン通知
//!
//! ### なぜこのテストが必要か
//! - 切断時の後始末は接続ごとにちょうど 1 回だけ効果を持つ必要がある
//! - 最後の接続が切れたときだけ `user:offline` を通知する
//!
//! ### どのような状況を想定しているか
//! - 正常系：Room に参加中の接続の切断
//! - エッジケース：同じユーザーの他の接続が残っている場合、二重の切断処理

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, MessagePusher, OutboundEvent, PresenceTransition,
};

use super::watch_party::WatchPartyUseCase;

/// ユーザー切断のユースケース
pub struct DisconnectUserUseCase {
    /// Connection Registry
    connections: Arc<dyn ConnectionRepository>,
    /// Room からの退出と通知
    watch_party: Arc<WatchPartyUseCase>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectUserUseCase {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        watch_party: Arc<WatchPartyUseCase>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            connections,
            watch_party,
            message_pusher,
        }
    }

    /// 切断処理を実行
    ///
    /// 1. MessagePusher から送信チャンネルを削除
    /// 2. Room に属していれば退出し、残りのメンバーに通知
    /// 3. Registry から削除し、最後の接続なら全接続に `user:offline` を送信
    ///
    /// 同じ接続 ID で二回呼ばれても、二回目は何もしない。
    pub async fn execute(&self, connection_id: &ConnectionId) -> PresenceTransition {
        self.message_pusher
            .unregister_connection(connection_id)
            .await;
        self.watch_party.leave_current_room(connection_id).await;

        let transition = self.connections.unregister(connection_id).await;
        if let PresenceTransition::WentOffline(user_id) = &transition {
            tracing::info!("User '{}' is now offline", user_id);
            let event = OutboundEvent::UserOffline(user_id.clone());
            if let Err(e) = self.message_pusher.broadcast_all(&event).await {
                tracing::warn!("Failed to broadcast user:offline: {}", e);
            }
        }

        transition
    }
}
