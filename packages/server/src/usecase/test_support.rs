//! UseCase テスト用のヘルパー

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use watchhub_shared::time::FixedClock;

use crate::{
    domain::{
        ConnectionId, DisplayName, Identity, MessagePushError, MessagePusher, OutboundEvent,
        PusherChannel, UserId,
    },
    infrastructure::repository::{InMemoryConnectionRepository, InMemoryRoomRepository},
};

pub const NOW: i64 = 1_700_000_000_000;

/// 送信内容を記録する MessagePusher
///
/// broadcast / broadcast_all は宛先ごとに 1 件として記録する。
#[derive(Default)]
pub struct RecordingMessagePusher {
    registered: Mutex<BTreeSet<ConnectionId>>,
    deliveries: Mutex<Vec<(ConnectionId, OutboundEvent)>>,
}

impl RecordingMessagePusher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 記録済みの送信を取り出してクリア
    pub async fn take(&self) -> Vec<(ConnectionId, OutboundEvent)> {
        std::mem::take(&mut *self.deliveries.lock().await)
    }

    /// 指定した接続に届いたイベント
    pub async fn events_for(&self, connection_id: &ConnectionId) -> Vec<OutboundEvent> {
        self.deliveries
            .lock()
            .await
            .iter()
            .filter(|(target, _)| target == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// 指定した名前のイベントを受け取った接続（重複なし、ソート済み）
    pub async fn recipients_of(&self, event_name: &str) -> Vec<ConnectionId> {
        let deliveries = self.deliveries.lock().await;
        let recipients: BTreeSet<ConnectionId> = deliveries
            .iter()
            .filter(|(_, event)| event.name() == event_name)
            .map(|(target, _)| target.clone())
            .collect();
        recipients.into_iter().collect()
    }
}

#[async_trait]
impl MessagePusher for RecordingMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, _sender: PusherChannel) {
        self.registered.lock().await.insert(connection_id);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        self.registered.lock().await.remove(connection_id);
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        self.deliveries
            .lock()
            .await
            .push((connection_id.clone(), event.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let mut deliveries = self.deliveries.lock().await;
        for target in targets {
            deliveries.push((target.clone(), event.clone()));
        }
        Ok(())
    }

    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError> {
        let registered = self.registered.lock().await;
        let mut deliveries = self.deliveries.lock().await;
        for target in registered.iter() {
            deliveries.push((target.clone(), event.clone()));
        }
        Ok(())
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn name(n: &str) -> DisplayName {
    DisplayName::new(n.to_string()).unwrap()
}

pub fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub fn identity(id: &str) -> Identity {
    Identity::new(user(id), name(id))
}

pub fn channel() -> PusherChannel {
    let (tx, _rx) = mpsc::unbounded_channel();
    tx
}

pub fn room_repository() -> Arc<InMemoryRoomRepository> {
    Arc::new(InMemoryRoomRepository::new(Arc::new(FixedClock::new(NOW))))
}

pub fn connection_repository() -> Arc<InMemoryConnectionRepository> {
    Arc::new(InMemoryConnectionRepository::new())
}
