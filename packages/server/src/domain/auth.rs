//! TokenVerifier trait 定義

use super::{entity::Identity, error::AuthError};

/// ベアラートークンを検証し、接続に付与する Identity を返す
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}
