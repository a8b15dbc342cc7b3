//! UseCase: フレンド関係の操作と通知
//!
//! 通知は常に当事者の 2 ユーザーの全接続に限られます。

use std::sync::Arc;

use crate::domain::{
    ConnectionRepository, FriendRepository, FriendRequest, FriendRequestId, MessagePusher,
    OutboundEvent, UserId,
};

use super::error::EventError;

/// フレンド操作のユースケース
pub struct FriendRequestUseCase {
    /// フレンドストア
    friends: Arc<dyn FriendRepository>,
    /// Connection Registry（ユーザー → 接続の解決）
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl FriendRequestUseCase {
    pub fn new(
        friends: Arc<dyn FriendRepository>,
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            friends,
            connections,
            message_pusher,
        }
    }

    /// ユーザーの全接続にイベントを送る
    async fn notify_user(&self, user_id: &UserId, event: &OutboundEvent) -> Result<(), EventError> {
        let targets = self.connections.connections_for(user_id).await;
        self.message_pusher.broadcast(&targets, event).await?;
        Ok(())
    }

    /// 申請を送る（相手に `friend:request`、申請者に `friend:request:sent`）
    pub async fn send(
        &self,
        requester_id: &UserId,
        target_id: &UserId,
    ) -> Result<FriendRequest, EventError> {
        let request = self.friends.send_request(requester_id, target_id).await?;
        tracing::info!(
            "Friend request '{}' from '{}' to '{}' is {}",
            request.id,
            requester_id,
            target_id,
            request.status.as_str()
        );

        self.notify_user(
            target_id,
            &OutboundEvent::FriendRequestReceived(request.clone()),
        )
        .await?;
        self.notify_user(
            requester_id,
            &OutboundEvent::FriendRequestSent(request.clone()),
        )
        .await?;
        Ok(request)
    }

    /// 申請を承認する（当事者の双方に `friend:accepted`）
    pub async fn accept(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, EventError> {
        let request = self.friends.accept_request(user_id, request_id).await?;
        self.notify_parties(&request, OutboundEvent::FriendAccepted(request.clone()))
            .await?;
        Ok(request)
    }

    /// 申請を拒否する（当事者の双方に `friend:rejected`）
    pub async fn reject(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, EventError> {
        let request = self.friends.reject_request(user_id, request_id).await?;
        self.notify_parties(&request, OutboundEvent::FriendRejected(request.clone()))
            .await?;
        Ok(request)
    }

    /// フレンドを削除する
    ///
    /// 双方に `friend:deleted` を送る。`friendId` はそれぞれ相手のユーザー ID。
    pub async fn delete(&self, user_id: &UserId, target_id: &UserId) -> Result<(), EventError> {
        self.friends.delete_friend(user_id, target_id).await?;
        tracing::info!("Friendship between '{}' and '{}' deleted", user_id, target_id);

        self.notify_user(
            user_id,
            &OutboundEvent::FriendDeleted {
                friend_id: target_id.clone(),
            },
        )
        .await?;
        self.notify_user(
            target_id,
            &OutboundEvent::FriendDeleted {
                friend_id: user_id.clone(),
            },
        )
        .await?;
        Ok(())
    }

    async fn notify_parties(
        &self,
        request: &FriendRequest,
        event: OutboundEvent,
    ) -> Result<(), EventError> {
        for party in request.parties() {
            self.notify_user(party, &event).await?;
        }
        Ok(())
    }
}
