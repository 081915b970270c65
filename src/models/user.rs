use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::SocialType;

/// ソーシャルログインユーザー
///
/// email が自然キー（UNIQUE）。ロールは social_type から導出し、DB には保存しない。
/// セッションにもこの形で保存される。
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// プロバイダが発行したサブジェクトID
    pub principal: String,
    pub social_type: SocialType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl User {
    /// ユーザーに割り当てられた権限
    pub fn role(&self) -> &'static str {
        self.social_type.role_type()
    }
}

/// 未保存のユーザー（プロフィールから変換した直後）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub principal: String,
    pub social_type: SocialType,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}
