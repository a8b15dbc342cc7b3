//! InMemory Conversation Repository 実装
//!
//! 会話とメッセージをプロセス内に保持します。
//! フレンド関係の確認は `FriendRepository` に委譲し、その呼び出しはロックの外で行います。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;
use watchhub_shared::time::Clock;

use crate::domain::{
    ChatMessage, Conversation, ConversationId, ConversationRepository, FriendRepository,
    FriendRequest, MessageContent, StoreError, Timestamp, UserId,
};

#[derive(Default)]
struct ConversationTable {
    conversations: HashMap<ConversationId, Conversation>,
    /// pair_key → ユーザー会話 ID
    user_conversations: HashMap<String, ConversationId>,
    messages: HashMap<ConversationId, Vec<ChatMessage>>,
}

/// インメモリ Conversation Repository 実装
pub struct InMemoryConversationRepository {
    table: Mutex<ConversationTable>,
    friends: Arc<dyn FriendRepository>,
    clock: Arc<dyn Clock>,
}

fn generate_conversation_id() -> Result<ConversationId, StoreError> {
    ConversationId::new(Uuid::new_v4().to_string())
        .map_err(|e| StoreError::Unavailable(e.to_string()))
}

fn conversation_not_found(conversation_id: &ConversationId) -> StoreError {
    StoreError::NotFound(format!("conversation '{}'", conversation_id))
}

impl InMemoryConversationRepository {
    pub fn new(friends: Arc<dyn FriendRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(ConversationTable::default()),
            friends,
            clock,
        }
    }

    async fn require_friendship(&self, a: &UserId, b: &UserId) -> Result<(), StoreError> {
        if self.friends.are_friends(a, b).await? {
            Ok(())
        } else {
            Err(StoreError::Forbidden(format!(
                "'{}' and '{}' are not friends",
                a, b
            )))
        }
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_or_create_user_conversation(
        &self,
        user_id: &UserId,
        participant_id: &UserId,
    ) -> Result<Conversation, StoreError> {
        self.require_friendship(user_id, participant_id).await?;

        let pair_key = FriendRequest::pair_key(user_id, participant_id);
        let mut table = self.table.lock().await;

        if let Some(existing) = table
            .user_conversations
            .get(&pair_key)
            .and_then(|id| table.conversations.get(id))
        {
            return Ok(existing.clone());
        }

        let conversation = Conversation {
            id: generate_conversation_id()?,
            participants: vec![user_id.clone(), participant_id.clone()],
            title: String::new(),
            last_message_preview: String::new(),
            last_message_at: None,
        };
        table
            .user_conversations
            .insert(pair_key, conversation.id.clone());
        table
            .conversations
            .insert(conversation.id.clone(), conversation.clone());

        Ok(conversation)
    }

    async fn find_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, StoreError> {
        let table = self.table.lock().await;
        table
            .conversations
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| conversation_not_found(conversation_id))
    }

    async fn append_user_message(
        &self,
        conversation_id: &ConversationId,
        sender_id: &UserId,
        content: &MessageContent,
    ) -> Result<ChatMessage, StoreError> {
        let conversation = self.find_conversation(conversation_id).await?;
        if !conversation.has_participant(sender_id) {
            return Err(StoreError::Forbidden(format!(
                "user '{}' is not a participant of conversation '{}'",
                sender_id, conversation_id
            )));
        }
        if let [first, second] = conversation.participants.as_slice() {
            self.require_friendship(first, second).await?;
        }

        let now = Timestamp::new(self.clock.now_millis());
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.clone(),
            sender_id: sender_id.clone(),
            content: content.clone(),
            created_at: now,
        };

        let mut table = self.table.lock().await;
        let stored = table
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| conversation_not_found(conversation_id))?;
        stored.last_message_preview = content.preview();
        stored.last_message_at = Some(now);
        table
            .messages
            .entry(conversation_id.clone())
            .or_default()
            .push(message.clone());

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::inmemory::InMemoryFriendRepository;
    use watchhub_shared::time::FixedClock;

    const NOW: i64 = 1_700_000_000_000;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    async fn create_test_repository(
        friend_pairs: &[(&str, &str)],
    ) -> InMemoryConversationRepository {
        let friends = InMemoryFriendRepository::new();
        for (a, b) in friend_pairs {
            let request = friends.send_request(&user(a), &user(b)).await.unwrap();
            friends.accept_request(&user(b), &request.id).await.unwrap();
        }
        InMemoryConversationRepository::new(Arc::new(friends), Arc::new(FixedClock::new(NOW)))
    }

    #[tokio::test]
    async fn test_find_or_create_requires_friendship() {
        // テスト項目: フレンドでないユーザーとの会話作成は Forbidden
        // given (前提条件):
        let repo = create_test_repository(&[]).await;

        // when (操作):
        let result = repo
            .find_or_create_user_conversation(&user("1"), &user("2"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_existing_conversation() {
        // テスト項目: 同じ組の会話は向きに関係なく再利用される
        // given (前提条件):
        let repo = create_test_repository(&[("1", "2")]).await;
        let created = repo
            .find_or_create_user_conversation(&user("1"), &user("2"))
            .await
            .unwrap();

        // when (操作):
        let found = repo
            .find_or_create_user_conversation(&user("2"), &user("1"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found.id, created.id);
        assert_eq!(found.participants, vec![user("1"), user("2")]);
    }

    #[tokio::test]
    async fn test_append_updates_preview_and_timestamp() {
        // テスト項目: メッセージ追加で会話のプレビューと最終時刻が更新される
        // given (前提条件):
        let repo = create_test_repository(&[("1", "2")]).await;
        let conversation = repo
            .find_or_create_user_conversation(&user("1"), &user("2"))
            .await
            .unwrap();
        let long_text = "a".repeat(150);

        // when (操作):
        let message = repo
            .append_user_message(&conversation.id, &user("2"), &content(&long_text))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.sender_id, user("2"));
        assert_eq!(message.created_at, Timestamp::new(NOW));
        let stored = repo.find_conversation(&conversation.id).await.unwrap();
        assert_eq!(stored.last_message_preview.chars().count(), 100);
        assert_eq!(stored.last_message_at, Some(Timestamp::new(NOW)));
        let table = repo.table.lock().await;
        assert_eq!(table.messages.get(&conversation.id), Some(&vec![message]));
    }

    #[tokio::test]
    async fn test_append_by_non_participant_is_forbidden() {
        // テスト項目: 参加者以外のメッセージ追加は Forbidden
        // given (前提条件):
        let repo = create_test_repository(&[("1", "2")]).await;
        let conversation = repo
            .find_or_create_user_conversation(&user("1"), &user("2"))
            .await
            .unwrap();

        // when (操作):
        let result = repo
            .append_user_message(&conversation.id, &user("3"), &content("hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Forbidden(_))));
        assert!(!repo.table.lock().await.messages.contains_key(&conversation.id));
    }

    #[tokio::test]
    async fn test_append_to_unknown_conversation_is_not_found() {
        // テスト項目: 存在しない会話へのメッセージ追加は NotFound
        // given (前提条件):
        let repo = create_test_repository(&[]).await;
        let unknown = ConversationId::new("missing".to_string()).unwrap();

        // when (操作):
        let result = repo
            .append_user_message(&unknown, &user("1"), &content("hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
