//! Conversion logic between DTOs and domain entities.

use watchhub_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, Conversation, FriendRequest, OutboundEvent, PlaybackPatch, PlaybackState, Room,
    RoomMember, UserId, ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::WireUserId> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: dto::WireUserId) -> Result<Self, Self::Error> {
        match value {
            dto::WireUserId::Number(n) => UserId::new(n.to_string()),
            dto::WireUserId::Text(s) => UserId::new(s),
        }
    }
}

impl TryFrom<dto::PlaybackPatchDto> for PlaybackPatch {
    type Error = ValueObjectError;

    fn try_from(dto: dto::PlaybackPatchDto) -> Result<Self, Self::Error> {
        PlaybackPatch::new(dto.video_url, dto.is_playing, dto.current_time)
    }
}

// ========================================
// Domain → DTO (WebSocket)
// ========================================

impl From<&UserId> for dto::WireUserId {
    fn from(id: &UserId) -> Self {
        match id.as_integer() {
            Some(n) => Self::Number(n),
            None => Self::Text(id.as_str().to_string()),
        }
    }
}

impl From<UserId> for dto::WireUserId {
    fn from(id: UserId) -> Self {
        Self::from(&id)
    }
}

impl From<RoomMember> for dto::MemberDto {
    fn from(member: RoomMember) -> Self {
        Self {
            id: member.id.into(),
            name: member.name.into_string(),
            connection_id: member.connection_id.as_str().to_string(),
        }
    }
}

impl From<PlaybackState> for dto::PlaybackStateDto {
    fn from(state: PlaybackState) -> Self {
        Self {
            video_url: state.video_url,
            is_playing: state.is_playing,
            current_time: state.current_time,
            last_updated: state.last_updated.value(),
        }
    }
}

impl From<Room> for dto::RoomDto {
    fn from(room: Room) -> Self {
        Self {
            room_id: room.id.into_string(),
            host_id: room.host_id.into(),
            host_name: room.host_name.into_string(),
            state: room.playback.into(),
            members: room.members.into_iter().map(Into::into).collect(),
            created_at: room.created_at.value(),
        }
    }
}

/// 会話の種類（ワイヤ上の `type`）。このサーバーが扱うのはユーザー間の会話のみ
const USER_CONVERSATION: &str = "user";

/// メッセージ送信者の役割（ワイヤ上の `role`）
const USER_ROLE: &str = "user";

impl From<Conversation> for dto::ConversationDto {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.into_string(),
            kind: USER_CONVERSATION.to_string(),
            participants: conversation
                .participants
                .into_iter()
                .map(Into::into)
                .collect(),
            title: conversation.title,
            last_message_preview: conversation.last_message_preview,
            last_message_at: conversation.last_message_at.map(|t| t.value()),
        }
    }
}

impl From<ChatMessage> for dto::ChatMessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id.into_string(),
            sender_id: message.sender_id.into(),
            role: USER_ROLE.to_string(),
            content: message.content.into_string(),
            created_at: message.created_at.value(),
        }
    }
}

impl From<FriendRequest> for dto::FriendRequestDto {
    fn from(request: FriendRequest) -> Self {
        Self {
            id: request.id.into_string(),
            requester_id: request.requester_id.into(),
            addressee_id: request.addressee_id.into(),
            status: request.status.as_str().to_string(),
            pair_key: request.pair_key,
        }
    }
}

impl From<OutboundEvent> for dto::ServerEvent {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::RoomCreated(room) => Self::RoomCreated(room.into()),
            OutboundEvent::RoomJoined(room) => Self::RoomJoined(room.into()),
            OutboundEvent::UserJoined {
                user_id,
                user_name,
                members,
            } => Self::UserJoined(dto::UserJoinedPayload {
                user_id: user_id.into(),
                user_name: user_name.into_string(),
                members: members.into_iter().map(Into::into).collect(),
            }),
            OutboundEvent::UserLeft { room_id, user_id } => Self::UserLeft(dto::UserLeftPayload {
                room_id: room_id.into_string(),
                user_id: user_id.into(),
            }),
            OutboundEvent::HostChanged {
                room_id,
                host_id,
                host_name,
            } => Self::HostChanged(dto::HostChangedPayload {
                room_id: room_id.into_string(),
                host_id: host_id.into(),
                host_name: host_name.into_string(),
            }),
            OutboundEvent::StateUpdated { room_id, state } => {
                Self::StateUpdated(dto::RoomStatePayload {
                    room_id: room_id.into_string(),
                    state: state.into(),
                })
            }
            OutboundEvent::SyncResponse { room_id, state } => {
                Self::SyncResponse(dto::RoomStatePayload {
                    room_id: room_id.into_string(),
                    state: state.into(),
                })
            }
            OutboundEvent::NewMessage {
                room_id,
                user_id,
                user_name,
                message,
            } => Self::NewMessage(dto::NewMessagePayload {
                room_id: room_id.into_string(),
                user_id: user_id.into(),
                user_name: user_name.into_string(),
                message: message.into_string(),
            }),
            OutboundEvent::UserOnline(user_id) => Self::UserOnline(dto::UserPresencePayload {
                user_id: user_id.into(),
            }),
            OutboundEvent::UserOffline(user_id) => Self::UserOffline(dto::UserPresencePayload {
                user_id: user_id.into(),
            }),
            OutboundEvent::OnlineUsers(user_ids) => Self::OnlineUsers(dto::OnlineUsersPayload {
                user_ids: user_ids.into_iter().map(Into::into).collect(),
            }),
            OutboundEvent::ChatMessage {
                conversation,
                message,
            } => Self::ChatMessage(dto::ChatMessagePayload {
                conversation_id: conversation.id.as_str().to_string(),
                message: message.into(),
                conversation: conversation.into(),
            }),
            OutboundEvent::FriendRequestReceived(request) => Self::FriendRequest(request.into()),
            OutboundEvent::FriendRequestSent(request) => Self::FriendRequestSent(request.into()),
            OutboundEvent::FriendAccepted(request) => Self::FriendAccepted(request.into()),
            OutboundEvent::FriendRejected(request) => Self::FriendRejected(request.into()),
            OutboundEvent::FriendDeleted { friend_id } => {
                Self::FriendDeleted(dto::FriendDeletedPayload {
                    friend_id: friend_id.into(),
                })
            }
            OutboundEvent::Error { kind, message } => Self::Error(dto::ErrorPayload {
                code: kind.code().to_string(),
                message,
            }),
        }
    }
}

// ========================================
// Domain → DTO (HTTP)
// ========================================

impl From<Room> for http::RoomSummaryDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.into_string(),
            host_id: room.host_id.into(),
            members: room.members.into_iter().map(|m| m.id.into()).collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<Room> for http::RoomDetailDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.into_string(),
            host_id: room.host_id.into(),
            host_name: room.host_name.into_string(),
            video_url: room.playback.video_url,
            is_playing: room.playback.is_playing,
            current_time: room.playback.current_time,
            last_updated: timestamp_to_rfc3339(room.playback.last_updated.value()),
            members: room
                .members
                .into_iter()
                .map(|m| http::MemberDetailDto {
                    id: m.id.into(),
                    name: m.name.into_string(),
                })
                .collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}
