//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する `ConnectionRepository` trait の具体的な実装。
//! 「ユーザー → 接続集合」と「接続 → ユーザー」の 2 つの索引を 1 つのロックで保護し、
//! presence の遷移判定を索引の更新と同じクリティカルセクションで行います。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionRepository, PresenceTransition, UserId};

#[derive(Default)]
struct ConnectionIndex {
    /// ユーザー ID → 接続 ID 集合（空集合は保持しない）
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
    /// 接続 ID → ユーザー ID（逆引き）
    by_connection: HashMap<ConnectionId, UserId>,
}

/// インメモリ Connection Registry
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    index: Mutex<ConnectionIndex>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn register(&self, connection_id: ConnectionId, user_id: UserId) -> PresenceTransition {
        let mut index = self.index.lock().await;

        if let Some(owner) = index.by_connection.get(&connection_id) {
            if owner != &user_id {
                tracing::warn!(
                    "Connection '{}' is already attached to user '{}', ignoring '{}'",
                    connection_id,
                    owner,
                    user_id
                );
            }
            return PresenceTransition::Unchanged;
        }

        index
            .by_connection
            .insert(connection_id.clone(), user_id.clone());
        let connections = index.by_user.entry(user_id.clone()).or_default();
        connections.insert(connection_id);

        if connections.len() == 1 {
            PresenceTransition::WentOnline(user_id)
        } else {
            PresenceTransition::Unchanged
        }
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> PresenceTransition {
        let mut index = self.index.lock().await;

        let Some(user_id) = index.by_connection.remove(connection_id) else {
            return PresenceTransition::Unchanged;
        };

        let now_empty = match index.by_user.get_mut(&user_id) {
            Some(connections) => {
                connections.remove(connection_id);
                connections.is_empty()
            }
            None => false,
        };

        if now_empty {
            index.by_user.remove(&user_id);
            PresenceTransition::WentOffline(user_id)
        } else {
            PresenceTransition::Unchanged
        }
    }

    async fn connections_for(&self, user_id: &UserId) -> Vec<ConnectionId> {
        let index = self.index.lock().await;
        let mut connections: Vec<ConnectionId> = index
            .by_user
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        connections.sort();
        connections
    }

    async fn is_online(&self, user_id: &UserId) -> bool {
        let index = self.index.lock().await;
        index.by_user.contains_key(user_id)
    }

    async fn online_users(&self) -> Vec<UserId> {
        let index = self.index.lock().await;
        let mut users: Vec<UserId> = index.by_user.keys().cloned().collect();
        users.sort();
        users
    }
}
