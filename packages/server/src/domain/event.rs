//! クライアントへ通知するドメインイベント
//!
//! ワイヤ形式への変換は Infrastructure 層（DTO）が行う。

use super::{
    entity::{ChatMessage, Conversation, FriendRequest, PlaybackState, Room, RoomMember},
    value_object::{DisplayName, MessageContent, RoomId, UserId},
};

/// 呼び出し元に返すエラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RoomNotFound,
    NotAuthorized,
    InvalidInput,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// ワイヤ上のエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    RoomCreated(Room),
    RoomJoined(Room),
    UserJoined {
        user_id: UserId,
        user_name: DisplayName,
        members: Vec<RoomMember>,
    },
    UserLeft {
        room_id: RoomId,
        user_id: UserId,
    },
    HostChanged {
        room_id: RoomId,
        host_id: UserId,
        host_name: DisplayName,
    },
    StateUpdated {
        room_id: RoomId,
        state: PlaybackState,
    },
    SyncResponse {
        room_id: RoomId,
        state: PlaybackState,
    },
    NewMessage {
        room_id: RoomId,
        user_id: UserId,
        user_name: DisplayName,
        message: MessageContent,
    },
    UserOnline(UserId),
    UserOffline(UserId),
    OnlineUsers(Vec<UserId>),
    ChatMessage {
        conversation: Conversation,
        message: ChatMessage,
    },
    FriendRequestReceived(FriendRequest),
    FriendRequestSent(FriendRequest),
    FriendAccepted(FriendRequest),
    FriendRejected(FriendRequest),
    FriendDeleted {
        friend_id: UserId,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl OutboundEvent {
    /// ワイヤ上のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => "room_created",
            Self::RoomJoined(_) => "room_joined",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::HostChanged { .. } => "host_changed",
            Self::StateUpdated { .. } => "state_updated",
            Self::SyncResponse { .. } => "sync_response",
            Self::NewMessage { .. } => "new_message",
            Self::UserOnline(_) => "user:online",
            Self::UserOffline(_) => "user:offline",
            Self::OnlineUsers(_) => "users:online:list",
            Self::ChatMessage { .. } => "chat:message",
            Self::FriendRequestReceived(_) => "friend:request",
            Self::FriendRequestSent(_) => "friend:request:sent",
            Self::FriendAccepted(_) => "friend:accepted",
            Self::FriendRejected(_) => "friend:rejected",
            Self::FriendDeleted { .. } => "friend:deleted",
            Self::Error { .. } => "error",
        }
    }
}
