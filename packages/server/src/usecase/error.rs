//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{
    ErrorKind, MessagePushError, OutboundEvent, RoomError, StoreError, ValueObjectError,
};

/// イベント処理のエラー
///
/// 呼び出し元の接続にだけ `error {code, message}` として返され、接続は維持される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) => ErrorKind::RoomNotFound,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 呼び出し元へ返すエラーイベント
    pub fn to_event(&self) -> OutboundEvent {
        OutboundEvent::Error {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<RoomError> for EventError {
    fn from(error: RoomError) -> Self {
        match &error {
            RoomError::RoomNotFound(room_id) => Self::RoomNotFound(room_id.to_string()),
            RoomError::NotAuthorized(_) => Self::NotAuthorized(error.to_string()),
        }
    }
}

impl From<StoreError> for EventError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Forbidden(reason) => Self::NotAuthorized(reason),
            StoreError::BadRequest(reason) => Self::InvalidInput(reason),
            StoreError::Unavailable(reason) => Self::Internal(reason),
        }
    }
}

impl From<ValueObjectError> for EventError {
    fn from(error: ValueObjectError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}

impl From<MessagePushError> for EventError {
    fn from(error: MessagePushError) -> Self {
        Self::Internal(error.to_string())
    }
}

/// Room 詳細取得のエラー（HTTP API）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}
