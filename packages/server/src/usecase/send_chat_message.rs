//! UseCase: ユーザー間チャットの送信
//!
//! ## 概要
//!
//! 会話の解決（既存の会話 ID、または相手ユーザーとの会話を作成）、メッセージの保存を
//! 外部ストアに委譲し、会話の全参加者の全接続に `chat:message` を送ります。
//! オフラインの参加者にはライブ配信されません（エラーではありません）。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 入力検証（空のメッセージ、宛先なし）
//! - ファンアウト先が参加者の全接続であること
//! - ストアのエラーがイベントエラーに変換されること

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRepository, ConversationId, ConversationRepository,
    MessageContent, MessagePusher, OutboundEvent, UserId,
};

use super::error::EventError;

/// チャット送信の宛先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    Conversation(ConversationId),
    Participant(UserId),
}

impl ChatTarget {
    /// 会話 ID を優先し、なければ相手ユーザー ID を使う
    pub fn resolve(
        conversation_id: Option<String>,
        participant_id: Option<UserId>,
    ) -> Result<Self, EventError> {
        match (conversation_id.filter(|id| !id.trim().is_empty()), participant_id) {
            (Some(id), _) => Ok(Self::Conversation(ConversationId::new(id)?)),
            (None, Some(participant)) => Ok(Self::Participant(participant)),
            (None, None) => Err(EventError::InvalidInput(
                "either conversationId or participantId is required".to_string(),
            )),
        }
    }
}

/// チャット送信のユースケース
pub struct SendChatMessageUseCase {
    /// 会話ストア
    conversations: Arc<dyn ConversationRepository>,
    /// Connection Registry（ユーザー → 接続の解決）
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendChatMessageUseCase {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            conversations,
            connections,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        sender_id: &UserId,
        target: ChatTarget,
        content: MessageContent,
    ) -> Result<ChatMessage, EventError> {
        let conversation_id = match target {
            ChatTarget::Conversation(id) => id,
            ChatTarget::Participant(participant_id) => {
                self.conversations
                    .find_or_create_user_conversation(sender_id, &participant_id)
                    .await?
                    .id
            }
        };

        let message = self
            .conversations
            .append_user_message(&conversation_id, sender_id, &content)
            .await?;
        let conversation = self.conversations.find_conversation(&conversation_id).await?;

        let mut targets: Vec<ConnectionId> = Vec::new();
        for participant in &conversation.participants {
            targets.extend(self.connections.connections_for(participant).await);
        }
        tracing::debug!(
            "Chat message in '{}' fans out to {} connection(s)",
            conversation_id,
            targets.len()
        );

        let event = OutboundEvent::ChatMessage {
            conversation,
            message: message.clone(),
        };
        self.message_pusher.broadcast(&targets, &event).await?;
        Ok(message)
    }
}
