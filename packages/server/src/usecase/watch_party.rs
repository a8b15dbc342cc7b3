//! UseCase: Watch-party Room の操作
//!
//! ## 概要
//!
//! Room のライフサイクル（作成・参加・退出）と、再生状態の同期、Room 内チャットを扱います。
//! ファンアウト先は常にその Room のメンバーの接続に限られます。
//!
//! 1 つの接続が属する Room は高々 1 つです。別の Room を作成・参加すると、
//! 直前の Room からは自動的に退出します。
//!
//! Room を変更する操作は、変更から通知の送信までを 1 件ずつ実行します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 各操作のファンアウト先（作成者のみ / 全メンバー / 送信者以外）
//! - ホスト以外の再生状態更新の拒否
//! - 退出時の `user_left` と `host_changed`
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成 → 参加 → 更新 → 退出
//! - 異常系：存在しない Room、メンバーでない送信者、空のメッセージ
//! - エッジケース：別の Room への移動、最後のメンバーの退出
//! - 並行性：同時に届いた再生状態の更新、移動先の Room が同時に閉じられる場合

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Departure, DisplayName, Identity, MessageContent, MessagePusher,
    OutboundEvent, PlaybackPatch, Room, RoomId, RoomRepository, UserId,
};

use super::error::EventError;

/// Watch-party Room のユースケース
pub struct WatchPartyUseCase {
    /// Room Coordinator
    rooms: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Room の状態変更とその通知を 1 件ずつ行うためのロック
    ///
    /// 変更から通知まで保持するので、各メンバーには変更が適用された順に通知が届く。
    sequencer: Mutex<()>,
}

impl WatchPartyUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
            sequencer: Mutex::new(()),
        }
    }

    /// Room を作成し、作成者に `room_created` を送る
    pub async fn create_room(
        &self,
        connection_id: ConnectionId,
        host_id: UserId,
        host_name: DisplayName,
    ) -> Result<Room, EventError> {
        let _sequence = self.sequencer.lock().await;
        self.leave_and_notify(&connection_id).await;

        let room = self
            .rooms
            .create_room(Identity::new(host_id, host_name), connection_id.clone())
            .await;
        tracing::info!("Room '{}' created by '{}'", room.id, room.host_id);

        self.message_pusher
            .push_to(&connection_id, &OutboundEvent::RoomCreated(room.clone()))
            .await?;
        Ok(room)
    }

    /// Room に参加する
    ///
    /// 全メンバー（参加者を含む）に `user_joined` を送り、その後参加者に `room_joined` を送る。
    /// 別の Room からの移動では、参加先が存在する場合に限り直前の Room から退出する。
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        user_id: UserId,
        user_name: DisplayName,
    ) -> Result<Room, EventError> {
        let _sequence = self.sequencer.lock().await;

        if let Some(current) = self.rooms.room_of(&connection_id).await
            && current != room_id
        {
            // ロック中は他の操作で Room が消えないので、確認後の退出と参加の間に失敗しない
            if self.rooms.get(&room_id).await.is_none() {
                return Err(EventError::RoomNotFound(room_id.into_string()));
            }
            self.leave_and_notify(&connection_id).await;
        }

        let room = self
            .rooms
            .join_room(&room_id, user_id.clone(), user_name.clone(), connection_id.clone())
            .await?;
        tracing::info!(
            "User '{}' joined room '{}' ({} member(s))",
            user_id,
            room.id,
            room.members.len()
        );

        let joined = OutboundEvent::UserJoined {
            user_id,
            user_name,
            members: room.members.clone(),
        };
        self.message_pusher
            .broadcast(&room.connection_ids(), &joined)
            .await?;
        self.message_pusher
            .push_to(&connection_id, &OutboundEvent::RoomJoined(room.clone()))
            .await?;
        Ok(room)
    }

    /// 明示的な退出（切断時と同じ通知を行う）
    pub async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<Departure, EventError> {
        let _sequence = self.sequencer.lock().await;

        let current = self.rooms.room_of(connection_id).await;
        if current.as_ref() != Some(room_id) {
            if self.rooms.get(room_id).await.is_none() {
                return Err(EventError::RoomNotFound(room_id.to_string()));
            }
            return Err(EventError::NotAuthorized(format!(
                "not a member of room '{}'",
                room_id
            )));
        }

        self.leave_and_notify(connection_id).await.ok_or_else(|| {
            EventError::NotAuthorized(format!("not a member of room '{}'", room_id))
        })
    }

    /// ホストによる再生状態の更新
    ///
    /// マージ後の状態を、送信元の接続以外の全メンバーに `state_updated` として送る。
    pub async fn update_state(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        user_id: &UserId,
        patch: &PlaybackPatch,
    ) -> Result<Room, EventError> {
        let _sequence = self.sequencer.lock().await;

        let room = self
            .rooms
            .update_playback_state(room_id, user_id, patch)
            .await
            .inspect_err(|e| {
                tracing::warn!("Rejected playback update from '{}': {}", user_id, e);
            })?;

        let targets: Vec<ConnectionId> = room
            .connection_ids()
            .into_iter()
            .filter(|id| id != connection_id)
            .collect();
        let event = OutboundEvent::StateUpdated {
            room_id: room.id.clone(),
            state: room.playback.clone(),
        };
        self.message_pusher.broadcast(&targets, &event).await?;
        Ok(room)
    }

    /// 現在の再生状態を要求元に送る
    pub async fn sync(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), EventError> {
        let room = self
            .rooms
            .get(room_id)
            .await
            .ok_or_else(|| EventError::RoomNotFound(room_id.to_string()))?;

        let event = OutboundEvent::SyncResponse {
            room_id: room.id,
            state: room.playback,
        };
        self.message_pusher.push_to(connection_id, &event).await?;
        Ok(())
    }

    /// Room 内チャット（送信者を含む全メンバーへ）
    pub async fn send_message(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        user_name: DisplayName,
        message: MessageContent,
    ) -> Result<(), EventError> {
        let _sequence = self.sequencer.lock().await;

        let room = self
            .rooms
            .get(room_id)
            .await
            .ok_or_else(|| EventError::RoomNotFound(room_id.to_string()))?;
        if room.member(&user_id).is_none() {
            return Err(EventError::NotAuthorized(format!(
                "'{}' is not a member of room '{}'",
                user_id, room_id
            )));
        }

        let event = OutboundEvent::NewMessage {
            room_id: room.id.clone(),
            user_id,
            user_name,
            message,
        };
        self.message_pusher
            .broadcast(&room.connection_ids(), &event)
            .await?;
        Ok(())
    }

    /// 接続が属している Room から退出する（属していなければ何もしない）
    pub async fn leave_current_room(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let _sequence = self.sequencer.lock().await;
        self.leave_and_notify(connection_id).await
    }

    /// 退出して残りのメンバーに通知する。呼び出し側が `sequencer` を保持していること
    async fn leave_and_notify(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let departure = self.rooms.leave(connection_id).await?;
        tracing::info!(
            "User '{}' left room '{}'",
            departure.user_id,
            departure.room_id
        );
        self.notify_departure(&departure).await;
        Some(departure)
    }

    /// `user_left` を送り、ホストが交代した場合は `host_changed` も送る
    async fn notify_departure(&self, departure: &Departure) {
        if departure.room_closed() {
            tracing::info!("Room '{}' closed", departure.room_id);
            return;
        }

        let left = OutboundEvent::UserLeft {
            room_id: departure.room_id.clone(),
            user_id: departure.user_id.clone(),
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(&departure.remaining_connections, &left)
            .await
        {
            tracing::warn!("Failed to broadcast user_left: {}", e);
        }

        if let Some(new_host) = &departure.new_host {
            tracing::info!(
                "Host of room '{}' moved to '{}'",
                departure.room_id,
                new_host.id
            );
            let changed = OutboundEvent::HostChanged {
                room_id: departure.room_id.clone(),
                host_id: new_host.id.clone(),
                host_name: new_host.name.clone(),
            };
            if let Err(e) = self
                .message_pusher
                .broadcast(&departure.remaining_connections, &changed)
                .await
            {
                tracing::warn!("Failed to broadcast host_changed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomMember, Timestamp},
        usecase::test_support::{
            NOW, RecordingMessagePusher, conn, name, room_repository, user,
        },
    };

    fn create_usecase() -> (WatchPartyUseCase, Arc<RecordingMessagePusher>) {
        let pusher = RecordingMessagePusher::new();
        let usecase = WatchPartyUseCase::new(room_repository(), pusher.clone());
        (usecase, pusher)
    }

    fn message(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    /// alice がホストの Room に bob が参加した状態を作る
    async fn setup_room(usecase: &WatchPartyUseCase) -> Room {
        let room = usecase
            .create_room(conn("c-alice"), user("alice"), name("Alice"))
            .await
            .unwrap();
        usecase
            .join_room(conn("c-bob"), room.id.clone(), user("bob"), name("Bob"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_room_unicasts_to_creator() {
        // テスト項目: room_created は作成者にのみ送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();

        // when (操作):
        let room = usecase
            .create_room(conn("c-alice"), user("alice"), name("Alice"))
            .await
            .unwrap();

        // then (期待する結果):
        let deliveries = pusher.take().await;
        assert_eq!(
            deliveries,
            vec![(conn("c-alice"), OutboundEvent::RoomCreated(room.clone()))]
        );
        assert_eq!(room.playback.last_updated, Timestamp::new(NOW));
        assert!(!room.playback.is_playing);
    }

    #[tokio::test]
    async fn test_join_room_fans_out_to_all_members_then_joiner() {
        // テスト項目: user_joined は参加者を含む全メンバーに、room_joined は参加者にのみ送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = usecase
            .create_room(conn("c-alice"), user("alice"), name("Alice"))
            .await
            .unwrap();
        pusher.take().await;

        // when (操作):
        let joined = usecase
            .join_room(conn("c-bob"), room.id.clone(), user("bob"), name("Bob"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            pusher.recipients_of("user_joined").await,
            vec![conn("c-alice"), conn("c-bob")]
        );
        assert_eq!(pusher.recipients_of("room_joined").await, vec![conn("c-bob")]);
        let bob_events = pusher.events_for(&conn("c-bob")).await;
        assert_eq!(bob_events.last(), Some(&OutboundEvent::RoomJoined(joined.clone())));
        assert_eq!(
            joined.members,
            vec![
                RoomMember {
                    id: user("alice"),
                    name: name("Alice"),
                    connection_id: conn("c-alice"),
                },
                RoomMember {
                    id: user("bob"),
                    name: name("Bob"),
                    connection_id: conn("c-bob"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_room_not_found() {
        // テスト項目: 存在しない Room への参加は RoomNotFound で、何も送られない
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let unknown = RoomId::new("MISSING1".to_string()).unwrap();

        // when (操作):
        let result = usecase
            .join_room(conn("c-bob"), unknown, user("bob"), name("Bob"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(EventError::RoomNotFound("MISSING1".to_string())));
        assert!(pusher.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_state_excludes_originating_connection() {
        // テスト項目: state_updated は送信元以外の全メンバーに、マージ後の状態で送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;
        let patch = PlaybackPatch::new(Some("https://v/1".to_string()), Some(true), None).unwrap();

        // when (操作):
        let updated = usecase
            .update_state(&conn("c-alice"), &room.id, &user("alice"), &patch)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            pusher.take().await,
            vec![(
                conn("c-bob"),
                OutboundEvent::StateUpdated {
                    room_id: room.id.clone(),
                    state: updated.playback.clone(),
                }
            )]
        );
        assert_eq!(updated.playback.video_url.as_deref(), Some("https://v/1"));
        assert!(updated.playback.is_playing);
    }

    #[tokio::test]
    async fn test_update_state_by_non_host_is_rejected() {
        // テスト項目: ホスト以外の更新は NotAuthorized で、ブロードキャストされない
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;
        let patch = PlaybackPatch::new(None, Some(true), None).unwrap();

        // when (操作):
        let result = usecase
            .update_state(&conn("c-bob"), &room.id, &user("bob"), &patch)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(EventError::NotAuthorized(_))));
        assert!(pusher.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_unicasts_current_state() {
        // テスト項目: sync_response は要求元にのみ送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;

        // when (操作):
        usecase.sync(&conn("c-bob"), &room.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            pusher.take().await,
            vec![(
                conn("c-bob"),
                OutboundEvent::SyncResponse {
                    room_id: room.id.clone(),
                    state: room.playback.clone(),
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_sync_unknown_room_is_room_not_found() {
        // テスト項目: 存在しない Room の同期要求は RoomNotFound
        // given (前提条件):
        let (usecase, _pusher) = create_usecase();
        let unknown = RoomId::new("MISSING1".to_string()).unwrap();

        // when (操作):
        let result = usecase.sync(&conn("c-bob"), &unknown).await;

        // then (期待する結果):
        assert!(matches!(result, Err(EventError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_send_message_reaches_all_members() {
        // テスト項目: new_message は送信者を含む全メンバーに送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;

        // when (操作):
        usecase
            .send_message(&room.id, user("bob"), name("Bob"), message("hello"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            pusher.recipients_of("new_message").await,
            vec![conn("c-alice"), conn("c-bob")]
        );
    }

    #[tokio::test]
    async fn test_send_message_by_non_member_is_rejected() {
        // テスト項目: メンバーでないユーザーのメッセージは NotAuthorized
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;

        // when (操作):
        let result = usecase
            .send_message(&room.id, user("mallory"), name("Mallory"), message("hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(EventError::NotAuthorized(_))));
        assert!(pusher.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_host_departure_notifies_remaining_members() {
        // テスト項目: ホストの退出で user_left と host_changed が残りのメンバーに送られる
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = setup_room(&usecase).await;
        pusher.take().await;

        // when (操作):
        let departure = usecase.leave_current_room(&conn("c-alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(departure.new_host.as_ref().map(|m| &m.id), Some(&user("bob")));
        assert_eq!(
            pusher.take().await,
            vec![
                (
                    conn("c-bob"),
                    OutboundEvent::UserLeft {
                        room_id: room.id.clone(),
                        user_id: user("alice"),
                    }
                ),
                (
                    conn("c-bob"),
                    OutboundEvent::HostChanged {
                        room_id: room.id.clone(),
                        host_id: user("bob"),
                        host_name: name("Bob"),
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_last_departure_closes_room_silently() {
        // テスト項目: 最後のメンバーの退出では誰にも送られず、Room は消える
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let room = usecase
            .create_room(conn("c-alice"), user("alice"), name("Alice"))
            .await
            .unwrap();
        pusher.take().await;

        // when (操作):
        let departure = usecase
            .leave_room(&conn("c-alice"), &room.id)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(departure.room_closed());
        assert!(pusher.take().await.is_empty());
        let rejoin = usecase
            .join_room(conn("c-bob"), room.id.clone(), user("bob"), name("Bob"))
            .await;
        assert!(matches!(rejoin, Err(EventError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_leave_room_not_member_is_rejected() {
        // テスト項目: 属していない Room からの退出は NotAuthorized
        // given (前提条件):
        let (usecase, _pusher) = create_usecase();
        let room = usecase
            .create_room(conn("c-alice"), user("alice"), name("Alice"))
            .await
            .unwrap();

        // when (操作):
        let result = usecase.leave_room(&conn("c-bob"), &room.id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(EventError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_joining_another_room_leaves_previous_one() {
        // テスト項目: 別の Room に参加すると、直前の Room から退出して通知される
        // given (前提条件):
        let (usecase, pusher) = create_usecase();
        let first = setup_room(&usecase).await;
        let second = usecase
            .create_room(conn("c-carol"), user("carol"), name("Carol"))
            .await
            .unwrap();
        pusher.take().await;

        // when (操作): bob が 2 つ目の Room に移動
        usecase
            .join_room(conn("c-bob"), second.id.clone(), user("bob"), name("Bob"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(pusher.recipients_of("user_left").await, vec![conn("c-alice")]);
        assert_eq!(
            pusher.recipients_of("user_joined").await,
            vec![conn("c-bob"), conn("c-carol")]
        );
        let first_after = usecase.rooms.get(&first.id).await.unwrap();
        assert!(first_after.member(&user("bob")).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_reach_members_in_applied_order() {
        // テスト項目: 同時に届いた更新でも、メンバーが最後に受け取る状態は保存された状態と一致する
        // given (前提条件): alice がホスト、2 つのタブから更新する。bob は視聴者
        let pusher = RecordingMessagePusher::new();
        let rooms = room_repository();
        let usecase = Arc::new(WatchPartyUseCase::new(rooms.clone(), pusher.clone()));
        let room = setup_room(&usecase).await;
        pusher.take().await;

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..50_i32 {
            let usecase = usecase.clone();
            let room_id = room.id.clone();
            let connection_id = if i % 2 == 0 {
                conn("c-alice")
            } else {
                conn("c-alice-tab")
            };
            handles.push(tokio::spawn(async move {
                let patch =
                    PlaybackPatch::new(None, Some(i % 3 == 0), Some(f64::from(i))).unwrap();
                usecase
                    .update_state(&connection_id, &room_id, &user("alice"), &patch)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // then (期待する結果):
        let stored = rooms.get(&room.id).await.unwrap().playback;
        let last_for_bob = pusher
            .events_for(&conn("c-bob"))
            .await
            .into_iter()
            .rev()
            .find_map(|event| match event {
                OutboundEvent::StateUpdated { state, .. } => Some(state),
                _ => None,
            });
        assert_eq!(last_for_bob, Some(stored));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_switching_to_a_closing_room_keeps_previous_membership() {
        // テスト項目: 移動先の Room が同時に閉じられた場合、参加に失敗した接続は元の Room に残る
        for _ in 0..20 {
            // given (前提条件): alice は 1 つ目の Room、carol は 2 つ目の Room に 1 人で参加
            let rooms = room_repository();
            let usecase = Arc::new(WatchPartyUseCase::new(
                rooms.clone(),
                RecordingMessagePusher::new(),
            ));
            let first = usecase
                .create_room(conn("c-alice"), user("alice"), name("Alice"))
                .await
                .unwrap();
            let second = usecase
                .create_room(conn("c-carol"), user("carol"), name("Carol"))
                .await
                .unwrap();

            // when (操作): alice の移動と carol の退出が同時に起きる
            let join = {
                let usecase = usecase.clone();
                let second_id = second.id.clone();
                tokio::spawn(async move {
                    usecase
                        .join_room(conn("c-alice"), second_id, user("alice"), name("Alice"))
                        .await
                })
            };
            let close = {
                let usecase = usecase.clone();
                tokio::spawn(async move { usecase.leave_current_room(&conn("c-carol")).await })
            };
            let joined = join.await.unwrap();
            close.await.unwrap();

            // then (期待する結果):
            match joined {
                Ok(room) => {
                    assert_eq!(room.id, second.id);
                    assert_eq!(rooms.room_of(&conn("c-alice")).await, Some(second.id.clone()));
                }
                Err(error) => {
                    assert_eq!(error, EventError::RoomNotFound(second.id.to_string()));
                    assert_eq!(rooms.room_of(&conn("c-alice")).await, Some(first.id.clone()));
                    assert!(rooms.get(&first.id).await.is_some());
                }
            }
        }
    }
}
