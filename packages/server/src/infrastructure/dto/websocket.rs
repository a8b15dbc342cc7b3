//! WebSocket event DTOs.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}` with camelCase
//! payload fields. Inbound and outbound event sets are closed enums; an unknown
//! event name fails to deserialize.

use serde::{Deserialize, Serialize};

/// User id as it appears on the wire.
///
/// Clients may send either a JSON number or a string. Ids that look like plain
/// integers are written back as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireUserId {
    Number(i64),
    Text(String),
}

// ========================================
// Client → Server
// ========================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "create_room")]
    CreateRoom(CreateRoomPayload),
    #[serde(rename = "join_room")]
    JoinRoom(JoinRoomPayload),
    #[serde(rename = "leave_room")]
    LeaveRoom(RoomRefPayload),
    #[serde(rename = "update_state")]
    UpdateState(UpdateStatePayload),
    #[serde(rename = "sync_request")]
    SyncRequest(RoomRefPayload),
    #[serde(rename = "send_message")]
    SendMessage(SendMessagePayload),
    #[serde(rename = "chat:send")]
    ChatSend(ChatSendPayload),
    #[serde(rename = "friend:request")]
    FriendRequest(FriendTargetPayload),
    #[serde(rename = "friend:accept")]
    FriendAccept(FriendRequestRefPayload),
    #[serde(rename = "friend:reject")]
    FriendReject(FriendRequestRefPayload),
    #[serde(rename = "friend:delete")]
    FriendDelete(FriendTargetPayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "create_room",
            Self::JoinRoom(_) => "join_room",
            Self::LeaveRoom(_) => "leave_room",
            Self::UpdateState(_) => "update_state",
            Self::SyncRequest(_) => "sync_request",
            Self::SendMessage(_) => "send_message",
            Self::ChatSend(_) => "chat:send",
            Self::FriendRequest(_) => "friend:request",
            Self::FriendAccept(_) => "friend:accept",
            Self::FriendReject(_) => "friend:reject",
            Self::FriendDelete(_) => "friend:delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomPayload {
    pub host_id: WireUserId,
    pub host_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub user_id: WireUserId,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRefPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatePayload {
    pub room_id: String,
    pub user_id: WireUserId,
    pub state: PlaybackPatchDto,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPatchDto {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_playing: Option<bool>,
    #[serde(default)]
    pub current_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    pub user_id: WireUserId,
    pub user_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendPayload {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub participant_id: Option<WireUserId>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendTargetPayload {
    pub target_user_id: WireUserId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestRefPayload {
    pub request_id: String,
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "room_created")]
    RoomCreated(RoomDto),
    #[serde(rename = "room_joined")]
    RoomJoined(RoomDto),
    #[serde(rename = "user_joined")]
    UserJoined(UserJoinedPayload),
    #[serde(rename = "user_left")]
    UserLeft(UserLeftPayload),
    #[serde(rename = "host_changed")]
    HostChanged(HostChangedPayload),
    #[serde(rename = "state_updated")]
    StateUpdated(RoomStatePayload),
    #[serde(rename = "sync_response")]
    SyncResponse(RoomStatePayload),
    #[serde(rename = "new_message")]
    NewMessage(NewMessagePayload),
    #[serde(rename = "user:online")]
    UserOnline(UserPresencePayload),
    #[serde(rename = "user:offline")]
    UserOffline(UserPresencePayload),
    #[serde(rename = "users:online:list")]
    OnlineUsers(OnlineUsersPayload),
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessagePayload),
    #[serde(rename = "friend:request")]
    FriendRequest(FriendRequestDto),
    #[serde(rename = "friend:request:sent")]
    FriendRequestSent(FriendRequestDto),
    #[serde(rename = "friend:accepted")]
    FriendAccepted(FriendRequestDto),
    #[serde(rename = "friend:rejected")]
    FriendRejected(FriendRequestDto),
    #[serde(rename = "friend:deleted")]
    FriendDeleted(FriendDeletedPayload),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: WireUserId,
    pub name: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateDto {
    pub video_url: Option<String>,
    pub is_playing: bool,
    pub current_time: f64,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub room_id: String,
    pub host_id: WireUserId,
    pub host_name: String,
    #[serde(flatten)]
    pub state: PlaybackStateDto,
    pub members: Vec<MemberDto>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedPayload {
    pub user_id: WireUserId,
    pub user_name: String,
    pub members: Vec<MemberDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftPayload {
    pub room_id: String,
    pub user_id: WireUserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostChangedPayload {
    pub room_id: String,
    pub host_id: WireUserId,
    pub host_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatePayload {
    pub room_id: String,
    #[serde(flatten)]
    pub state: PlaybackStateDto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub room_id: String,
    pub user_id: WireUserId,
    pub user_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresencePayload {
    pub user_id: WireUserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersPayload {
    pub user_ids: Vec<WireUserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub participants: Vec<WireUserId>,
    pub title: String,
    pub last_message_preview: String,
    pub last_message_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: WireUserId,
    pub role: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub conversation_id: String,
    pub message: ChatMessageDto,
    pub conversation: ConversationDto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestDto {
    pub id: String,
    pub requester_id: WireUserId,
    pub addressee_id: WireUserId,
    pub status: String,
    pub pair_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDeletedPayload {
    pub friend_id: WireUserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}
