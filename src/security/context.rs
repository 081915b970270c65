use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session};

use super::Authentication;

/// セキュリティコンテキストを保存するセッションキー
pub const SECURITY_CONTEXT_KEY: &str = "security_context";

/// リクエスト単位のセキュリティコンテキスト
///
/// グローバルには保持せず、セッションから読み込んで明示的に受け渡す
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityContext {
    pub authentication: Option<Authentication>,
}

impl SecurityContext {
    pub fn new(authentication: Authentication) -> Self {
        Self {
            authentication: Some(authentication),
        }
    }

    /// セッションからコンテキストを読み込む（未保存なら空）
    pub async fn load(session: &Session) -> Result<Self, session::Error> {
        Ok(session
            .get::<Self>(SECURITY_CONTEXT_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, session: &Session) -> Result<(), session::Error> {
        session.insert(SECURITY_CONTEXT_KEY, self).await
    }
}
