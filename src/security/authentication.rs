//! 認証済みプリンシパルの表現
//!
//! OAuth2 ログイン直後は [`OAuth2AuthenticationToken`]、権限の再設定後は
//! [`PreauthenticatedToken`] になる。どちらもセッションに保存される。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// プロバイダから受け取った未加工のプロフィール
pub type RawProfile = Map<String, Value>;

/// 再設定後トークンのクレデンシャル（パスワード等は保持しない）
pub const NOT_APPLICABLE_CREDENTIALS: &str = "N/A";

/// OAuth2 ログインで生成される認証トークン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2AuthenticationToken {
    /// userinfo エンドポイントのレスポンスそのまま
    pub attributes: RawProfile,
    /// 認証したプロバイダの登録ID（"google", "kakao" など）
    pub registration_id: String,
    pub authorities: Vec<String>,
}

/// 権限再設定時に差し替えられる認証トークン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreauthenticatedToken {
    pub principal: RawProfile,
    pub credentials: String,
    pub authorities: Vec<String>,
}

impl PreauthenticatedToken {
    pub fn new(principal: RawProfile, authorities: Vec<String>) -> Self {
        Self {
            principal,
            credentials: NOT_APPLICABLE_CREDENTIALS.to_string(),
            authorities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Authentication {
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2AuthenticationToken),
    #[serde(rename = "preauthenticated")]
    Preauthenticated(PreauthenticatedToken),
}

impl Authentication {
    pub fn authorities(&self) -> &[String] {
        match self {
            Self::OAuth2(token) => &token.authorities,
            Self::Preauthenticated(token) => &token.authorities,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities().iter().any(|a| a == authority)
    }

    /// OAuth2 トークンであれば参照を返す
    pub fn as_oauth2(&self) -> Option<&OAuth2AuthenticationToken> {
        match self {
            Self::OAuth2(token) => Some(token),
            Self::Preauthenticated(_) => None,
        }
    }
}
