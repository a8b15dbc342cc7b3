//! Inbound event dispatch.
//!
//! テキストフレームを `ClientEvent` にパースし、ペイロードをドメインの値に変換して
//! 対応するユースケースを呼び出します。失敗はすべてここで回収し、
//! 送信元の接続にだけ `error {code, message}` を返します。

use crate::{
    domain::{
        ConnectionId, DisplayName, FriendRequestId, Identity, MessageContent, PlaybackPatch,
        RoomId, UserId,
    },
    infrastructure::dto::websocket::{ClientEvent, WireUserId},
    ui::state::AppState,
    usecase::{ChatTarget, EventError},
};

/// 認証済みの接続
pub struct Session {
    pub connection_id: ConnectionId,
    pub identity: Identity,
}

impl Session {
    /// ペイロードのユーザー ID が認証済みユーザーと一致することを確認する
    fn bind_user(&self, claimed: WireUserId) -> Result<UserId, EventError> {
        let user_id = UserId::try_from(claimed)?;
        if user_id != self.identity.user_id {
            return Err(EventError::NotAuthorized(format!(
                "payload user '{}' does not match the authenticated user",
                user_id
            )));
        }
        Ok(user_id)
    }
}

/// 1 フレームを処理する
pub async fn dispatch_text(state: &AppState, session: &Session, text: &str) {
    let result = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => {
            tracing::debug!(
                "Received '{}' from connection '{}'",
                event.name(),
                session.connection_id
            );
            handle_event(state, session, event).await
        }
        Err(e) => Err(EventError::InvalidInput(format!("malformed event: {}", e))),
    };

    let Err(error) = result else {
        return;
    };
    match &error {
        EventError::Internal(_) => tracing::error!(
            "Event from '{}' failed: {}",
            session.connection_id,
            error
        ),
        _ => tracing::warn!(
            "Event from '{}' rejected: {}",
            session.connection_id,
            error
        ),
    }
    if let Err(e) = state
        .message_pusher
        .push_to(&session.connection_id, &error.to_event())
        .await
    {
        tracing::warn!(
            "Failed to send error to '{}': {}",
            session.connection_id,
            e
        );
    }
}

async fn handle_event(
    state: &AppState,
    session: &Session,
    event: ClientEvent,
) -> Result<(), EventError> {
    let connection_id = &session.connection_id;
    let watch_party = &state.watch_party_usecase;

    match event {
        ClientEvent::CreateRoom(payload) => {
            let host_id = session.bind_user(payload.host_id)?;
            let host_name = DisplayName::new(payload.host_name)?;
            watch_party
                .create_room(connection_id.clone(), host_id, host_name)
                .await?;
        }
        ClientEvent::JoinRoom(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let user_id = session.bind_user(payload.user_id)?;
            let user_name = DisplayName::new(payload.user_name)?;
            watch_party
                .join_room(connection_id.clone(), room_id, user_id, user_name)
                .await?;
        }
        ClientEvent::LeaveRoom(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            watch_party.leave_room(connection_id, &room_id).await?;
        }
        ClientEvent::UpdateState(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let user_id = session.bind_user(payload.user_id)?;
            let patch = PlaybackPatch::try_from(payload.state)?;
            watch_party
                .update_state(connection_id, &room_id, &user_id, &patch)
                .await?;
        }
        ClientEvent::SyncRequest(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            watch_party.sync(connection_id, &room_id).await?;
        }
        ClientEvent::SendMessage(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            let user_id = session.bind_user(payload.user_id)?;
            let user_name = DisplayName::new(payload.user_name)?;
            let message = MessageContent::new(payload.message)?;
            watch_party
                .send_message(&room_id, user_id, user_name, message)
                .await?;
        }
        ClientEvent::ChatSend(payload) => {
            let content = MessageContent::new(payload.content)?;
            let participant_id = payload
                .participant_id
                .map(UserId::try_from)
                .transpose()?;
            let target = ChatTarget::resolve(payload.conversation_id, participant_id)?;
            state
                .send_chat_message_usecase
                .execute(&session.identity.user_id, target, content)
                .await?;
        }
        ClientEvent::FriendRequest(payload) => {
            let target_id = UserId::try_from(payload.target_user_id)?;
            state
                .friend_request_usecase
                .send(&session.identity.user_id, &target_id)
                .await?;
        }
        ClientEvent::FriendAccept(payload) => {
            let request_id = FriendRequestId::new(payload.request_id)?;
            state
                .friend_request_usecase
                .accept(&session.identity.user_id, &request_id)
                .await?;
        }
        ClientEvent::FriendReject(payload) => {
            let request_id = FriendRequestId::new(payload.request_id)?;
            state
                .friend_request_usecase
                .reject(&session.identity.user_id, &request_id)
                .await?;
        }
        ClientEvent::FriendDelete(payload) => {
            let target_id = UserId::try_from(payload.target_user_id)?;
            state
                .friend_request_usecase
                .delete(&session.identity.user_id, &target_id)
                .await?;
        }
    }

    Ok(())
}
