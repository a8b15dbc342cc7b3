//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::WireUserId;

/// Room summary for `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub host_id: WireUserId,
    pub members: Vec<WireUserId>,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub id: WireUserId,
    pub name: String,
}

/// Room detail for `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub host_id: WireUserId,
    pub host_name: String,
    pub video_url: Option<String>,
    pub is_playing: bool,
    pub current_time: f64,
    /// RFC 3339 (UTC)
    pub last_updated: String,
    pub members: Vec<MemberDetailDto>,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Online users for `GET /api/presence`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub user_ids: Vec<WireUserId>,
}
