use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ソーシャルログインプロバイダ種別
///
/// DB には Postgres の enum 型 `social_type` として保存される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "social_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SocialType {
    Google,
    Kakao,
}

impl SocialType {
    /// 登録ID（コールバック URL やセッション内トークンで使用）
    pub fn registration_id(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Kakao => "kakao",
        }
    }

    /// プロバイダ種別に対応する権限文字列
    pub fn role_type(self) -> &'static str {
        match self {
            Self::Google => "ROLE_GOOGLE",
            Self::Kakao => "ROLE_KAKAO",
        }
    }
}

impl fmt::Display for SocialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.registration_id())
    }
}

/// 未対応の登録ID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported registration id: {0}")]
pub struct UnknownSocialType(pub String);

impl FromStr for SocialType {
    type Err = UnknownSocialType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "kakao" => Ok(Self::Kakao),
            other => Err(UnknownSocialType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_type() {
        assert_eq!(SocialType::Google.role_type(), "ROLE_GOOGLE");
        assert_eq!(SocialType::Kakao.role_type(), "ROLE_KAKAO");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("google".parse::<SocialType>(), Ok(SocialType::Google));
        assert_eq!("kakao".parse::<SocialType>(), Ok(SocialType::Kakao));
        // 大文字は登録IDとして扱わない
        assert!("GOOGLE".parse::<SocialType>().is_err());
        assert_eq!(
            "facebook".parse::<SocialType>(),
            Err(UnknownSocialType("facebook".to_string()))
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SocialType::Kakao).unwrap();
        assert_eq!(json, "\"kakao\"");
    }
}
