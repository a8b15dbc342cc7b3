//! UseCase: ユーザー接続処理（Presence）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::execute() メソッド
//! - 接続登録、オンライン一覧のスナップショット送信、オンライン通知
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の接続でオンライン通知が全接続に届く
//! - エッジケース：同じユーザーの 2 本目の接続ではオンライン通知しない

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, MessagePusher, OutboundEvent, PresenceTransition,
    PusherChannel, UserId,
};

/// ユーザー接続のユースケース
pub struct ConnectUserUseCase {
    /// Connection Registry
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectUserUseCase {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            connections,
            message_pusher,
        }
    }

    /// 接続を登録し、presence を通知する
    ///
    /// 1. 送信チャンネルを MessagePusher に登録
    /// 2. Registry に登録し、遷移を判定
    /// 3. オフライン → オンラインの遷移なら全接続に `user:online` を送信
    /// 4. 新しい接続にオンライン一覧を送信（一覧が最後に届くフレームになる）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        sender: PusherChannel,
    ) -> PresenceTransition {
        self.message_pusher
            .register_connection(connection_id.clone(), sender)
            .await;
        let transition = self
            .connections
            .register(connection_id.clone(), user_id)
            .await;

        if let PresenceTransition::WentOnline(user_id) = &transition {
            tracing::info!("User '{}' is now online", user_id);
            let event = OutboundEvent::UserOnline(user_id.clone());
            if let Err(e) = self.message_pusher.broadcast_all(&event).await {
                tracing::warn!("Failed to broadcast user:online: {}", e);
            }
        }

        let snapshot = OutboundEvent::OnlineUsers(self.connections.online_users().await);
        if let Err(e) = self.message_pusher.push_to(&connection_id, &snapshot).await {
            tracing::warn!(
                "Failed to send online users to '{}': {}",
                connection_id,
                e
            );
        }

        transition
    }
}
