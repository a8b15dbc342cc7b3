//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する `RoomRepository` trait の具体的な実装（Room Coordinator）。
//! Room 表と「接続 → Room」の逆引きを 1 つのロックで保護し、両者を常に同時に更新します。
//!
//! 逆引きに載っている接続は、必ずその Room のいずれかのメンバーの現在の接続です。
//! 再参加で接続が差し替わった場合、古い接続は逆引きから外れます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use watchhub_shared::time::Clock;

use crate::domain::{
    ConnectionId, Departure, DisplayName, Identity, PlaybackPatch, Room, RoomError, RoomId,
    RoomIdFactory, RoomRepository, Timestamp, UserId,
};

#[derive(Default)]
struct RoomTable {
    rooms: HashMap<RoomId, Room>,
    /// 接続 ID → Room ID（逆引き）
    connection_rooms: HashMap<ConnectionId, RoomId>,
}

impl RoomTable {
    fn generate_room_id(&self) -> RoomId {
        loop {
            let id = RoomIdFactory::generate();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    table: Mutex<RoomTable>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    ///
    /// `clock` は Room の作成時刻と再生状態の更新時刻に使う
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(RoomTable::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, host: Identity, connection_id: ConnectionId) -> Room {
        let now = self.now();
        let mut table = self.table.lock().await;

        let room_id = table.generate_room_id();
        let room = Room::new(room_id.clone(), host, connection_id.clone(), now);
        table.rooms.insert(room_id.clone(), room.clone());
        table.connection_rooms.insert(connection_id, room_id);

        room
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        user_name: DisplayName,
        connection_id: ConnectionId,
    ) -> Result<Room, RoomError> {
        let mut table = self.table.lock().await;

        let room = table
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let replaced = room.upsert_member(user_id, user_name, connection_id.clone());
        let snapshot = room.clone();

        if let Some(stale) = replaced {
            table.connection_rooms.remove(&stale);
        }
        table.connection_rooms.insert(connection_id, room_id.clone());

        Ok(snapshot)
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let mut table = self.table.lock().await;

        let room_id = table.connection_rooms.remove(connection_id)?;
        let room = table.rooms.get_mut(&room_id)?;
        let removal = room.remove_member_by_connection(connection_id)?;

        let remaining_member_count = room.members.len();
        let remaining_connections = room.connection_ids();
        if room.is_empty() {
            table.rooms.remove(&room_id);
        }

        Some(Departure {
            room_id,
            user_id: removal.member.id,
            user_name: removal.member.name,
            remaining_member_count,
            remaining_connections,
            new_host: removal.new_host,
        })
    }

    async fn update_playback_state(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        patch: &PlaybackPatch,
    ) -> Result<Room, RoomError> {
        let now = self.now();
        let mut table = self.table.lock().await;

        let room = table
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        if !room.is_host(user_id) {
            return Err(RoomError::NotAuthorized(room_id.clone()));
        }
        room.apply_patch(patch, now);

        Ok(room.clone())
    }

    async fn get(&self, room_id: &RoomId) -> Option<Room> {
        let table = self.table.lock().await;
        table.rooms.get(room_id).cloned()
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let table = self.table.lock().await;
        table.connection_rooms.get(connection_id).cloned()
    }

    async fn list(&self) -> Vec<Room> {
        let table = self.table.lock().await;
        let mut rooms: Vec<Room> = table.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchhub_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Room のライフサイクル（absent → active → absent）
    // - ホストのみが再生状態を更新できること、部分マージ
    // - 退出の冪等性とホストの再割り当て
    //
    // 【どのようなシナリオをテストするか】
    // 1. A が作成 → B が参加 → A が切断 → B がホスト → B が切断 → Room 消滅
    // 2. 存在しない Room への参加は RoomNotFound で、Room は作られない
    // 3. 非ホストの更新は NotAuthorized で、状態は変わらない
    // ========================================

    const NOW: i64 = 1_700_000_000_000;

    fn create_test_repository() -> InMemoryRoomRepository {
        InMemoryRoomRepository::new(Arc::new(FixedClock::new(NOW)))
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn name(n: &str) -> DisplayName {
        DisplayName::new(n.to_string()).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn identity(id: &str) -> Identity {
        Identity::new(user(id), name(id))
    }

    #[tokio::test]
    async fn test_create_room_seeds_host() {
        // テスト項目: Room 作成でホストが唯一のメンバーになり、逆引きに登録される
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let room = repo.create_room(identity("alice"), conn("c-alice")).await;

        // then (期待する結果):
        assert_eq!(room.members.len(), 1);
        assert_eq!(room.host_id, user("alice"));
        assert_eq!(room.playback.last_updated, Timestamp::new(NOW));
        assert_eq!(repo.get(&room.id).await, Some(room.clone()));
        assert_eq!(repo.room_of(&conn("c-alice")).await, Some(room.id));
    }

    #[tokio::test]
    async fn test_host_handover_scenario() {
        // テスト項目: A 作成 → B 参加 → A 切断で B がホスト → B 切断で Room 消滅
        // given (前提条件):
        let repo = create_test_repository();
        let room = repo.create_room(identity("A"), conn("c-a")).await;

        // when (操作): B が参加
        let joined = repo
            .join_room(&room.id, user("B"), name("B"), conn("c-b"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.members.len(), 2);
        assert_eq!(joined.host_id, user("A"));

        // when (操作): A の接続が切れる
        let departure = repo.leave(&conn("c-a")).await.unwrap();

        // then (期待する結果):
        assert_eq!(departure.room_id, room.id);
        assert_eq!(departure.user_id, user("A"));
        assert_eq!(departure.remaining_member_count, 1);
        assert_eq!(departure.remaining_connections, vec![conn("c-b")]);
        assert_eq!(departure.new_host.as_ref().map(|m| &m.id), Some(&user("B")));
        assert_eq!(repo.get(&room.id).await.unwrap().host_id, user("B"));

        // when (操作): B も切断
        let last = repo.leave(&conn("c-b")).await.unwrap();

        // then (期待する結果):
        assert!(last.room_closed());
        assert_eq!(repo.get(&room.id).await, None);
        assert!(repo.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_room_does_not_create_it() {
        // テスト項目: 存在しない Room への参加は RoomNotFound で、副作用がない
        // given (前提条件):
        let repo = create_test_repository();
        let unknown = RoomId::new("ZZZZZZZZ".to_string()).unwrap();

        // when (操作):
        let result = repo
            .join_room(&unknown, user("bob"), name("Bob"), conn("c-bob"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::RoomNotFound(unknown.clone())));
        assert_eq!(repo.get(&unknown).await, None);
        assert_eq!(repo.room_of(&conn("c-bob")).await, None);
    }

    #[tokio::test]
    async fn test_rejoin_updates_connection_in_place() {
        // テスト項目: 既存メンバーの再参加は接続 ID を差し替え、古い接続の退出は無効になる
        // given (前提条件):
        let repo = create_test_repository();
        let room = repo.create_room(identity("alice"), conn("c-alice")).await;
        repo.join_room(&room.id, user("bob"), name("Bob"), conn("c-bob-1"))
            .await
            .unwrap();

        // when (操作):
        let rejoined = repo
            .join_room(&room.id, user("bob"), name("Bob"), conn("c-bob-2"))
            .await
            .unwrap();
        let stale_leave = repo.leave(&conn("c-bob-1")).await;

        // then (期待する結果):
        assert_eq!(rejoined.members.len(), 2);
        assert_eq!(stale_leave, None);
        assert_eq!(repo.room_of(&conn("c-bob-2")).await, Some(room.id.clone()));
        assert_eq!(repo.get(&room.id).await.unwrap().members.len(), 2);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: 同じ接続の二回目の退出は何もしない
        // given (前提条件):
        let repo = create_test_repository();
        let room = repo.create_room(identity("alice"), conn("c-alice")).await;
        repo.join_room(&room.id, user("bob"), name("Bob"), conn("c-bob"))
            .await
            .unwrap();

        // when (操作):
        let first = repo.leave(&conn("c-bob")).await;
        let second = repo.leave(&conn("c-bob")).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert_eq!(second, None);
        assert_eq!(repo.get(&room.id).await.unwrap().members.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_unknown_connection_is_none() {
        // テスト項目: Room に属していない接続の退出は None
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let result = repo.leave(&conn("c-nobody")).await;

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_non_host_update_is_rejected_without_mutation() {
        // テスト項目: 非ホストの更新は NotAuthorized で、状態は変わらない
        // given (前提条件):
        let repo = create_test_repository();
        let room = repo.create_room(identity("alice"), conn("c-alice")).await;
        repo.join_room(&room.id, user("bob"), name("Bob"), conn("c-bob"))
            .await
            .unwrap();
        let before = repo.get(&room.id).await.unwrap();

        // when (操作):
        let patch = PlaybackPatch::new(Some("evil".to_string()), Some(true), Some(99.0)).unwrap();
        let result = repo
            .update_playback_state(&room.id, &user("bob"), &patch)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotAuthorized(room.id.clone())));
        assert_eq!(repo.get(&room.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_merges_partial_state() {
        // テスト項目: {videoUrl: "x", currentTime: 30} の後の {isPlaying: true} は他を保持する
        // given (前提条件):
        let repo = create_test_repository();
        let room = repo.create_room(identity("alice"), conn("c-alice")).await;
        let first = PlaybackPatch::new(Some("x".to_string()), None, Some(30.0)).unwrap();
        repo.update_playback_state(&room.id, &user("alice"), &first)
            .await
            .unwrap();

        // when (操作):
        let second = PlaybackPatch::new(None, Some(true), None).unwrap();
        let updated = repo
            .update_playback_state(&room.id, &user("alice"), &second)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(updated.playback.video_url.as_deref(), Some("x"));
        assert_eq!(updated.playback.current_time, 30.0);
        assert!(updated.playback.is_playing);
    }

    #[tokio::test]
    async fn test_update_unknown_room_is_not_found() {
        // テスト項目: 存在しない Room の更新は RoomNotFound
        // given (前提条件):
        let repo = create_test_repository();
        let unknown = RoomId::new("NOPE0000".to_string()).unwrap();
        let patch = PlaybackPatch::new(None, Some(true), None).unwrap();

        // when (操作):
        let result = repo
            .update_playback_state(&unknown, &user("alice"), &patch)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::RoomNotFound(unknown)));
    }

    #[tokio::test]
    async fn test_rooms_are_independent() {
        // テスト項目: 別の Room への操作は互いに影響しない
        // given (前提条件):
        let repo = create_test_repository();
        let room1 = repo.create_room(identity("alice"), conn("c-alice")).await;
        let room2 = repo.create_room(identity("bob"), conn("c-bob")).await;

        // when (操作):
        repo.leave(&conn("c-alice")).await;

        // then (期待する結果):
        assert_ne!(room1.id, room2.id);
        assert_eq!(repo.get(&room1.id).await, None);
        assert_eq!(repo.get(&room2.id).await.unwrap().members.len(), 1);
        assert_eq!(repo.list().await.len(), 1);
    }
}
