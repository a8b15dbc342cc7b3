//! Server state and dependency wiring.

use std::sync::Arc;

use watchhub_shared::time::Clock;

use crate::{
    domain::{MessagePusher, TokenVerifier},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{
            InMemoryConnectionRepository, InMemoryConversationRepository,
            InMemoryFriendRepository, InMemoryRoomRepository,
        },
    },
    usecase::{
        ConnectUserUseCase, DisconnectUserUseCase, FriendRequestUseCase, GetOnlineUsersUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, SendChatMessageUseCase, WatchPartyUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// TokenVerifier（接続時の認証）
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// MessagePusher（エラーの返信に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// ConnectUserUseCase（接続と presence のユースケース）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// DisconnectUserUseCase（切断のユースケース）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    /// WatchPartyUseCase（Room 操作のユースケース）
    pub watch_party_usecase: Arc<WatchPartyUseCase>,
    /// SendChatMessageUseCase（ユーザー間チャットのユースケース）
    pub send_chat_message_usecase: Arc<SendChatMessageUseCase>,
    /// FriendRequestUseCase（フレンド操作のユースケース）
    pub friend_request_usecase: Arc<FriendRequestUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（Room 詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// GetOnlineUsersUseCase（オンラインユーザー一覧取得のユースケース）
    pub get_online_users_usecase: Arc<GetOnlineUsersUseCase>,
}

impl AppState {
    /// インメモリ実装で依存関係を組み立てる
    ///
    /// 1. Repository / 外部ストア
    /// 2. MessagePusher
    /// 3. UseCases
    pub fn in_memory(token_verifier: Arc<dyn TokenVerifier>, clock: Arc<dyn Clock>) -> Self {
        // 1. Repository（プロセス内の状態）と外部ストアのインメモリ実装
        let connections = Arc::new(InMemoryConnectionRepository::new());
        let rooms = Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let friends = Arc::new(InMemoryFriendRepository::new());
        let conversations = Arc::new(InMemoryConversationRepository::new(
            friends.clone(),
            clock,
        ));

        // 2. MessagePusher（WebSocket 実装）
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. UseCases
        let watch_party_usecase = Arc::new(WatchPartyUseCase::new(
            rooms.clone(),
            message_pusher.clone(),
        ));

        Self {
            token_verifier,
            message_pusher: message_pusher.clone(),
            connect_user_usecase: Arc::new(ConnectUserUseCase::new(
                connections.clone(),
                message_pusher.clone(),
            )),
            disconnect_user_usecase: Arc::new(DisconnectUserUseCase::new(
                connections.clone(),
                watch_party_usecase.clone(),
                message_pusher.clone(),
            )),
            watch_party_usecase,
            send_chat_message_usecase: Arc::new(SendChatMessageUseCase::new(
                conversations,
                connections.clone(),
                message_pusher.clone(),
            )),
            friend_request_usecase: Arc::new(FriendRequestUseCase::new(
                friends,
                connections.clone(),
                message_pusher,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(rooms.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(rooms)),
            get_online_users_usecase: Arc::new(GetOnlineUsersUseCase::new(connections)),
        }
    }
}
