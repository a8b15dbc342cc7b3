//! HS256 JWT を使った TokenVerifier 実装
//!
//! クレームの `userId`（数値または文字列）を論理ユーザー ID、`username` を表示名として使います。
//! `username` がない場合はユーザー ID を表示名にします。

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{AuthError, DisplayName, Identity, TokenVerifier, UserId},
    infrastructure::dto::websocket::WireUserId,
};

/// JWT クレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtClaims {
    pub user_id: WireUserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// 有効期限（Unix 秒）
    pub exp: u64,
}

pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        let user_id =
            UserId::try_from(claims.user_id).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let name = claims
            .username
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user_id.as_str().to_string());
        let display_name =
            DisplayName::new(name).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(Identity::new(user_id, display_name))
    }
}
