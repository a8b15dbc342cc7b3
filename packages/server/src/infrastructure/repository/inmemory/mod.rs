//! インメモリ Repository 実装

mod connection;
mod conversation;
mod friend;
mod room;

pub use connection::InMemoryConnectionRepository;
pub use conversation::InMemoryConversationRepository;
pub use friend::InMemoryFriendRepository;
pub use room::InMemoryRoomRepository;
