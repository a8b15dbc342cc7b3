//! ドメイン層のエラー定義

use thiserror::Error;

use super::value_object::RoomId;

/// Value Object の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} has an invalid format: '{value}'")]
    InvalidFormat { field: &'static str, value: String },
    #[error("{field} is too long ({actual} > {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Room Coordinator のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room '{0}' not found")]
    RoomNotFound(RoomId),
    #[error("only the host can control playback in room '{0}'")]
    NotAuthorized(RoomId),
}

/// 外部ドキュメントストア（会話・フレンド）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// トークン検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
    #[error("failed to serialize event: {0}")]
    Serialization(String),
}
