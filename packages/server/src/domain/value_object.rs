//! Value Object 定義
//!
//! 生の `String` を境界で検証し、ドメイン層では型で区別します。

use uuid::Uuid;

use super::error::ValueObjectError;

/// Room ID の文字数
pub const ROOM_ID_LENGTH: usize = 8;

const ROOM_ID_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// チャットメッセージ本文の最大長（文字数）
pub const MAX_MESSAGE_CHARS: usize = 4000;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// 空でない文字列から生成
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                if value.trim().is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// 論理ユーザー ID（認証済みトークンのクレームから得る）
    UserId,
    "user id"
);
impl UserId {
    /// 正規の整数表記（`"42"`、`"-7"`）なら数値として返す
    ///
    /// `"007"` や `"+1"` のように数値に戻すと表記が変わるものは `None`。
    pub fn as_integer(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

string_id!(
    /// 会話 ID（外部ストアが採番）
    ConversationId,
    "conversation id"
);
string_id!(
    /// フレンドリクエスト ID（外部ストアが採番）
    FriendRequestId,
    "friend request id"
);

/// トランスポート層の接続 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい接続 ID を採番（UUID v4）
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("connection id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Watch-party Room ID
///
/// `[0-9A-Z]` の 8 文字。クライアントが手入力することを想定し、大文字小文字は区別しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValueObjectError::Empty("room id"));
        }
        if !normalized.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ValueObjectError::InvalidFormat {
                field: "room id",
                value,
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room ID の採番
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// ランダムな Room ID を生成（36^8 通り）
    ///
    /// UUID v4 の 122 bit の乱数部分を 36 進数に変換して使う。
    pub fn generate() -> RoomId {
        let mut bits = Uuid::new_v4().as_u128();
        let mut id = String::with_capacity(ROOM_ID_LENGTH);
        for _ in 0..ROOM_ID_LENGTH {
            let index = (bits % 36) as usize;
            id.push(ROOM_ID_ALPHABET[index] as char);
            bits /= 36;
        }
        RoomId(id)
    }
}

/// 表示名（ホスト名・メンバー名）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("display name"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// メッセージ本文
///
/// 前後の空白を除去した上で空でないこと、[`MAX_MESSAGE_CHARS`] 以下であること。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("message content"));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ValueObjectError::TooLong {
                field: "message content",
                max: MAX_MESSAGE_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 会話一覧用のプレビュー（先頭 100 文字）
    pub fn preview(&self) -> String {
        self.0.chars().take(100).collect()
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
