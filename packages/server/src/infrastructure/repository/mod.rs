//! Repository 実装

pub mod inmemory;

pub use inmemory::{
    InMemoryConnectionRepository, InMemoryConversationRepository, InMemoryFriendRepository,
    InMemoryRoomRepository,
};
