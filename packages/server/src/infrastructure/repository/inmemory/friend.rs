//! InMemory Friend Repository 実装
//!
//! フレンド関係は 2 ユーザーの組（`pair_key`）ごとに 1 レコードで表し、
//! `pending → accepted / rejected` の状態遷移で管理します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    FriendRepository, FriendRequest, FriendRequestId, FriendRequestStatus, StoreError, UserId,
};

#[derive(Default)]
struct FriendTable {
    requests: HashMap<FriendRequestId, FriendRequest>,
    /// pair_key → リクエスト ID
    by_pair: HashMap<String, FriendRequestId>,
}

/// インメモリ Friend Repository 実装
#[derive(Default)]
pub struct InMemoryFriendRepository {
    table: Mutex<FriendTable>,
}

impl InMemoryFriendRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn generate_request_id() -> Result<FriendRequestId, StoreError> {
    FriendRequestId::new(Uuid::new_v4().to_string())
        .map_err(|e| StoreError::Unavailable(e.to_string()))
}

/// 宛先ユーザーによる承認・拒否
async fn respond(
    table: &Mutex<FriendTable>,
    user_id: &UserId,
    request_id: &FriendRequestId,
    status: FriendRequestStatus,
) -> Result<FriendRequest, StoreError> {
    let mut table = table.lock().await;
    let request = table
        .requests
        .get_mut(request_id)
        .ok_or_else(|| StoreError::NotFound(format!("friend request '{}'", request_id)))?;
    if &request.addressee_id != user_id {
        return Err(StoreError::BadRequest(format!(
            "user '{}' cannot respond to friend request '{}'",
            user_id, request_id
        )));
    }
    request.status = status;
    Ok(request.clone())
}

#[async_trait]
impl FriendRepository for InMemoryFriendRepository {
    async fn send_request(
        &self,
        requester_id: &UserId,
        target_id: &UserId,
    ) -> Result<FriendRequest, StoreError> {
        if requester_id == target_id {
            return Err(StoreError::BadRequest(
                "cannot send a friend request to yourself".to_string(),
            ));
        }

        let pair_key = FriendRequest::pair_key(requester_id, target_id);
        let mut table = self.table.lock().await;

        let Some(existing_id) = table.by_pair.get(&pair_key).cloned() else {
            let request = FriendRequest {
                id: generate_request_id()?,
                requester_id: requester_id.clone(),
                addressee_id: target_id.clone(),
                status: FriendRequestStatus::Pending,
                pair_key: pair_key.clone(),
            };
            table.by_pair.insert(pair_key, request.id.clone());
            table.requests.insert(request.id.clone(), request.clone());
            return Ok(request);
        };
        let request = table
            .requests
            .get_mut(&existing_id)
            .ok_or_else(|| StoreError::Unavailable(format!("friend pair '{}'", pair_key)))?;

        match request.status {
            FriendRequestStatus::Accepted => {}
            FriendRequestStatus::Pending => {
                // 相手からの保留中リクエストがあれば相互申請として承認
                if &request.requester_id != requester_id {
                    request.status = FriendRequestStatus::Accepted;
                }
            }
            FriendRequestStatus::Rejected => {
                request.status = FriendRequestStatus::Pending;
                request.requester_id = requester_id.clone();
                request.addressee_id = target_id.clone();
            }
        }
        Ok(request.clone())
    }

    async fn accept_request(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, StoreError> {
        respond(&self.table, user_id, request_id, FriendRequestStatus::Accepted).await
    }

    async fn reject_request(
        &self,
        user_id: &UserId,
        request_id: &FriendRequestId,
    ) -> Result<FriendRequest, StoreError> {
        respond(&self.table, user_id, request_id, FriendRequestStatus::Rejected).await
    }

    async fn are_friends(&self, user_id: &UserId, other_id: &UserId) -> Result<bool, StoreError> {
        let pair_key = FriendRequest::pair_key(user_id, other_id);
        let table = self.table.lock().await;
        let accepted = table
            .by_pair
            .get(&pair_key)
            .and_then(|id| table.requests.get(id))
            .is_some_and(|r| r.status == FriendRequestStatus::Accepted);
        Ok(accepted)
    }

    async fn delete_friend(&self, user_id: &UserId, target_id: &UserId) -> Result<(), StoreError> {
        let pair_key = FriendRequest::pair_key(user_id, target_id);
        let mut table = self.table.lock().await;

        let accepted_id = table
            .by_pair
            .get(&pair_key)
            .filter(|id| {
                table
                    .requests
                    .get(*id)
                    .is_some_and(|r| r.status == FriendRequestStatus::Accepted)
            })
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "friendship between '{}' and '{}'",
                    user_id, target_id
                ))
            })?;

        table.by_pair.remove(&pair_key);
        table.requests.remove(&accepted_id);
        Ok(())
    }
}
