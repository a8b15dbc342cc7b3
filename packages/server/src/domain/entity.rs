//! Entity 定義
//!
//! Room はプロセス内にのみ存在するエフェメラルな集約。
//! Conversation / ChatMessage / FriendRequest は外部ストアが所有し、
//! ここでは認可とファンアウトの計算に必要な形だけを持つ。

use super::{
    error::ValueObjectError,
    value_object::{
        ConnectionId, ConversationId, DisplayName, FriendRequestId, MessageContent, RoomId,
        Timestamp, UserId,
    },
};

/// 認証済み接続に一度だけ付与される利用者情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: DisplayName,
}

impl Identity {
    pub fn new(user_id: UserId, display_name: DisplayName) -> Self {
        Self {
            user_id,
            display_name,
        }
    }
}

/// Registry の変化（presence 通知のトリガー）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceTransition {
    /// 最初の接続が登録された
    WentOnline(UserId),
    /// 最後の接続が削除された
    WentOffline(UserId),
    Unchanged,
}

/// Room のメンバー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub id: UserId,
    pub name: DisplayName,
    pub connection_id: ConnectionId,
}

/// 共有再生状態
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub video_url: Option<String>,
    pub is_playing: bool,
    /// 再生位置（秒）
    pub current_time: f64,
    pub last_updated: Timestamp,
}

impl PlaybackState {
    /// 動画なし・停止・位置 0
    pub fn initial(now: Timestamp) -> Self {
        Self {
            video_url: None,
            is_playing: false,
            current_time: 0.0,
            last_updated: now,
        }
    }
}

/// 再生状態の部分更新
///
/// 指定されたフィールドだけをマージする。空文字の `video_url` は動画の解除を意味する。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackPatch {
    video_url: Option<String>,
    is_playing: Option<bool>,
    current_time: Option<f64>,
}

impl PlaybackPatch {
    pub fn new(
        video_url: Option<String>,
        is_playing: Option<bool>,
        current_time: Option<f64>,
    ) -> Result<Self, ValueObjectError> {
        if let Some(time) = current_time
            && (!time.is_finite() || time < 0.0)
        {
            return Err(ValueObjectError::OutOfRange {
                field: "current time",
                value: time.to_string(),
            });
        }
        if video_url.is_none() && is_playing.is_none() && current_time.is_none() {
            return Err(ValueObjectError::Empty("playback state"));
        }
        Ok(Self {
            video_url,
            is_playing,
            current_time,
        })
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn is_playing(&self) -> Option<bool> {
        self.is_playing
    }

    pub fn current_time(&self) -> Option<f64> {
        self.current_time
    }
}

/// メンバー削除の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRemoval {
    pub member: RoomMember,
    /// ホストが抜けたために新しくホストになったメンバー
    pub new_host: Option<RoomMember>,
}

/// Watch-party Room
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub host_id: UserId,
    pub host_name: DisplayName,
    pub playback: PlaybackState,
    /// 参加順。メンバー ID ごとに 1 エントリ
    pub members: Vec<RoomMember>,
    pub created_at: Timestamp,
}

impl Room {
    /// ホストを唯一のメンバーとして Room を作成
    pub fn new(
        id: RoomId,
        host: Identity,
        connection_id: ConnectionId,
        created_at: Timestamp,
    ) -> Self {
        let host_member = RoomMember {
            id: host.user_id.clone(),
            name: host.display_name.clone(),
            connection_id,
        };
        Self {
            id,
            host_id: host.user_id,
            host_name: host.display_name,
            playback: PlaybackState::initial(created_at),
            members: vec![host_member],
            created_at,
        }
    }

    pub fn is_host(&self, user_id: &UserId) -> bool {
        &self.host_id == user_id
    }

    pub fn member(&self, user_id: &UserId) -> Option<&RoomMember> {
        self.members.iter().find(|m| &m.id == user_id)
    }

    /// メンバーを追加、既存メンバーなら接続 ID を差し替える
    ///
    /// # Returns
    ///
    /// 差し替えられた古い接続 ID（新規追加・同一接続の場合は `None`）
    pub fn upsert_member(
        &mut self,
        user_id: UserId,
        name: DisplayName,
        connection_id: ConnectionId,
    ) -> Option<ConnectionId> {
        if let Some(existing) = self.members.iter_mut().find(|m| m.id == user_id) {
            if existing.connection_id == connection_id {
                return None;
            }
            return Some(std::mem::replace(
                &mut existing.connection_id,
                connection_id,
            ));
        }
        self.members.push(RoomMember {
            id: user_id,
            name,
            connection_id,
        });
        None
    }

    /// 接続 ID に対応するメンバーを削除し、必要ならホストを先頭メンバーに移す
    pub fn remove_member_by_connection(
        &mut self,
        connection_id: &ConnectionId,
    ) -> Option<MemberRemoval> {
        let index = self
            .members
            .iter()
            .position(|m| &m.connection_id == connection_id)?;
        let member = self.members.remove(index);

        let new_host = match self.members.first() {
            Some(next) if member.id == self.host_id => {
                self.host_id = next.id.clone();
                self.host_name = next.name.clone();
                Some(next.clone())
            }
            _ => None,
        };

        Some(MemberRemoval { member, new_host })
    }

    /// 部分更新をマージし、更新時刻を記録
    pub fn apply_patch(&mut self, patch: &PlaybackPatch, now: Timestamp) {
        if let Some(url) = patch.video_url() {
            self.playback.video_url = if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            };
        }
        if let Some(is_playing) = patch.is_playing() {
            self.playback.is_playing = is_playing;
        }
        if let Some(current_time) = patch.current_time() {
            self.playback.current_time = current_time;
        }
        self.playback.last_updated = now;
    }

    /// Room スコープのファンアウト対象
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.members
            .iter()
            .map(|m| m.connection_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Room からの退出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub user_name: DisplayName,
    pub remaining_member_count: usize,
    /// 退出通知の送り先
    pub remaining_connections: Vec<ConnectionId>,
    pub new_host: Option<RoomMember>,
}

impl Departure {
    /// Room が削除されたか
    pub fn room_closed(&self) -> bool {
        self.remaining_member_count == 0
    }
}

/// ユーザー間の会話（外部ストア所有）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    pub title: String,
    pub last_message_preview: String,
    pub last_message_at: Option<Timestamp>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participants.contains(user_id)
    }
}

/// 会話内のメッセージ（外部ストア所有）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

/// フレンドリクエストの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// フレンドリクエスト（外部ストア所有）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    pub id: FriendRequestId,
    pub requester_id: UserId,
    pub addressee_id: UserId,
    pub status: FriendRequestStatus,
    pub pair_key: String,
}

impl FriendRequest {
    /// 2 ユーザー間で順序に依存しないキー
    ///
    /// 両方が整数 ID なら数値として、それ以外は文字列として小さい方を先にする。
    pub fn pair_key(a: &UserId, b: &UserId) -> String {
        let a_first = match (a.as_integer(), b.as_integer()) {
            (Some(x), Some(y)) => x <= y,
            _ => a <= b,
        };
        let (min, max) = if a_first { (a, b) } else { (b, a) };
        format!("{min}:{max}")
    }

    /// 通知対象となる 2 者
    pub fn parties(&self) -> [&UserId; 2] {
        [&self.requester_id, &self.addressee_id]
    }
}
