//! プロバイダ別プロフィールの変換
//!
//! userinfo の未加工マップを登録IDごとのスキーマでデコードし、
//! ローカルの [`NewUser`] に正規化する。

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::models::{NewUser, SocialType};
use crate::security::RawProfile;

/// Google userinfo (v2) のフラットなプロフィール
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleProfile {
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Kakao `/v2/user/me` のネストしたプロフィール
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KakaoProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub properties: KakaoProperties,
    pub kakao_account: KakaoAccount,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KakaoProperties {
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KakaoAccount {
    /// 同意項目でメール提供を拒否された場合は存在しない
    pub email: String,
}

/// 登録IDごとにデコード済みのプロフィール
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderProfile {
    Google(GoogleProfile),
    Kakao(KakaoProfile),
}

impl ProviderProfile {
    /// 登録IDに対応するスキーマでプロフィールをデコード
    ///
    /// # Errors
    /// - 未対応の登録ID: `AppError::UnsupportedProvider`
    /// - 必須フィールド欠落・型不一致: `AppError::MalformedProfile`
    pub fn parse(registration_id: &str, attributes: &RawProfile) -> Result<Self, AppError> {
        let social_type: SocialType = registration_id.parse()?;
        let value = Value::Object(attributes.clone());

        let profile = match social_type {
            SocialType::Google => serde_json::from_value(value).map(Self::Google),
            SocialType::Kakao => serde_json::from_value(value).map(Self::Kakao),
        };

        profile.map_err(|e| AppError::MalformedProfile {
            provider: registration_id.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn social_type(&self) -> SocialType {
        match self {
            Self::Google(_) => SocialType::Google,
            Self::Kakao(_) => SocialType::Kakao,
        }
    }

    /// ローカルユーザーへ変換
    ///
    /// Kakao は updated_at を設定しない（既存データとの互換のため Google と非対称）
    pub fn into_new_user(self, now: OffsetDateTime) -> NewUser {
        match self {
            Self::Google(profile) => NewUser {
                name: profile.name,
                email: profile.email,
                principal: profile.id,
                social_type: SocialType::Google,
                created_at: now,
                updated_at: Some(now),
            },
            Self::Kakao(profile) => NewUser {
                name: profile.properties.nickname,
                email: profile.kakao_account.email,
                principal: profile.id,
                social_type: SocialType::Kakao,
                created_at: now,
                updated_at: None,
            },
        }
    }
}

/// Kakao の id は数値、Google は文字列で返ってくる
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
