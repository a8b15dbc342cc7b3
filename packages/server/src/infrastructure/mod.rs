//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装（インメモリ Repository、WebSocket MessagePusher、
//! JWT TokenVerifier）と、ワイヤ形式の DTO を提供する。

pub mod auth;
pub mod dto;
pub mod message_pusher;
pub mod repository;
