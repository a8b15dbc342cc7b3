//! UseCase: 参照系（HTTP API 用）
//!
//! Room 一覧・Room 詳細・オンラインユーザー一覧を返します。

use std::sync::Arc;

use crate::domain::{ConnectionRepository, Room, RoomId, RoomRepository, UserId};

use super::error::GetRoomDetailError;

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// 稼働中の Room（ID 順）
    pub async fn execute(&self) -> Vec<Room> {
        self.rooms.list().await
    }
}

/// Room 詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn execute(&self, room_id: String) -> Result<Room, GetRoomDetailError> {
        let room_id = RoomId::new(room_id.clone())
            .map_err(|_| GetRoomDetailError::InvalidRoomId(room_id))?;
        self.rooms
            .get(&room_id)
            .await
            .ok_or_else(|| GetRoomDetailError::RoomNotFound(room_id.into_string()))
    }
}

/// オンラインユーザー一覧取得のユースケース
pub struct GetOnlineUsersUseCase {
    connections: Arc<dyn ConnectionRepository>,
}

impl GetOnlineUsersUseCase {
    pub fn new(connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { connections }
    }

    pub async fn execute(&self) -> Vec<UserId> {
        self.connections.online_users().await
    }
}
