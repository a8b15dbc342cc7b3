//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! - `ConnectionRepository` / `RoomRepository`: プロセス内のインメモリ状態
//! - `ConversationRepository` / `FriendRepository`: 外部ドキュメントストア

use async_trait::async_trait;

use super::{
    entity::{
        ChatMessage, Conversation, Departure, FriendRequest, Identity, PlaybackPatch,
        PresenceTransition, Room,
    },
    error::{RoomError, StoreError},
    value_object::{
        ConnectionId, ConversationId, DisplayName, FriendRequestId, MessageContent, RoomId, UserId,
    },
};

/// Connection Registry
///
/// 接続 ID とユーザー ID の対応（順方向・逆方向）を保持する。
/// オンライン/オフラインの遷移判定は登録・削除と同じロックの中で行う。
/// 操作は失敗しない。未知の ID は「存在しない」として扱う。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// 接続を登録。ユーザーの最初の接続なら `WentOnline`
    async fn register(&self, connection_id: ConnectionId, user_id: UserId) -> PresenceTransition;

    /// 接続を削除。ユーザーの最後の接続なら `WentOffline`
    async fn unregister(&self, connection_id: &ConnectionId) -> PresenceTransition;

    /// ユーザーの接続 ID 一覧（未知のユーザーなら空）
    async fn connections_for(&self, user_id: &UserId) -> Vec<ConnectionId>;

    async fn is_online(&self, user_id: &UserId) -> bool;

    /// オンラインのユーザー ID 一覧（ソート済み）
    async fn online_users(&self) -> Vec<UserId>;
}

/// Room Coordinator
///
/// Room の生成・参加・退出・再生状態の更新。Room 表と「接続 → Room」の逆引きを
/// 同じロックで更新する。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を作成し、ホストを唯一のメンバーとして登録
    async fn create_room(&self, host: Identity, connection_id: ConnectionId) -> Room;

    /// 既存の Room に参加（既存メンバーなら接続 ID を更新）
    async fn join_room(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        user_name: DisplayName,
        connection_id: ConnectionId,
    ) -> Result<Room, RoomError>;

    /// 接続を Room から退出させる。Room に属していなければ `None`
    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure>;

    /// ホストによる再生状態の部分更新
    async fn update_playback_state(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        patch: &PlaybackPatch,
    ) -> Result<Room, RoomError>;

    async fn get(&self, room_id: &RoomId) -> Option<Room>;

    /// 接続が属している Room の ID
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 全 Room（ID 順）
    async fn list(&self) -> Vec<Room>;
}

/// 会話・メッセージの外部ストア
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 2 ユーザー間の会話を取得、なければ作成（フレンドであることが必要）
    async fn find_or_create_user_conversation(
        &self,
        user_id: &UserId,
        participant_id: &UserId,
    ) -> Result<Conversation, StoreError>;

    async fn find_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, StoreError>;

    /// ユーザーのメッセージを追加（参加者であること、ユーザー会話ならフレンドであることが必要）
    async fn append_user_message(
        &self,
        conversation_id: &ConversationId,
        sender_id: &UserId,
        content: &MessageContent,
    ) -> Result<ChatMessage, StoreError>;
}

/// フレンド関係の外部ストア
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendRepository: Send + Sync {
    async fn send_request(
        &self,
        requester_id: &UserId,
        target_id: &UserId,
    ) -> Result<FriendRequest, StoreError>;

    /// 宛先ユーザーのみが承認できる
    async fn accept_request(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, StoreError>;

    /// 宛先ユーザーのみが拒否できる
    async fn reject_request(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, StoreError>;

    async fn are_friends(&self, user_id: &UserId, other_id: &UserId) -> Result<bool, StoreError>;

    async fn delete_friend(&self, user_id: &UserId, target_id: &UserId) -> Result<(), StoreError>;
}
