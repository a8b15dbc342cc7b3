//! UseCase 層
//!
//! ドメインの trait（Repository / MessagePusher）だけに依存し、
//! 各イベントの認可とファンアウト先の計算を行う。

pub mod connect_user;
pub mod disconnect_user;
pub mod error;
pub mod friend_request;
pub mod get_rooms;
pub mod send_chat_message;
pub mod watch_party;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_user::ConnectUserUseCase;
pub use disconnect_user::DisconnectUserUseCase;
pub use error::{EventError, GetRoomDetailError};
pub use friend_request::FriendRequestUseCase;
pub use get_rooms::{GetOnlineUsersUseCase, GetRoomDetailUseCase, GetRoomsUseCase};
pub use send_chat_message::{ChatTarget, SendChatMessageUseCase};
pub use watch_party::WatchPartyUseCase;
