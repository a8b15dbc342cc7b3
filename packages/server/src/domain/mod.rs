//! Domain 層
//!
//! エンティティ、Value Object、イベント、そして外部とのインターフェース（trait）を定義する。

pub mod auth;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use auth::TokenVerifier;
pub use entity::{
    ChatMessage, Conversation, Departure, FriendRequest, FriendRequestStatus, Identity,
    MemberRemoval, PlaybackPatch, PlaybackState, PresenceTransition, Room, RoomMember,
};
pub use error::{AuthError, MessagePushError, RoomError, StoreError, ValueObjectError};
pub use event::{ErrorKind, OutboundEvent};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{
    ConnectionRepository, ConversationRepository, FriendRepository, RoomRepository,
};
pub use value_object::{
    ConnectionId, ConversationId, DisplayName, FriendRequestId, MessageContent, RoomId,
    RoomIdFactory, Timestamp, UserId,
};

#[cfg(test)]
pub use repository::{MockConversationRepository, MockFriendRepository};
