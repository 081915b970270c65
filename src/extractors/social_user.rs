//! `SocialUser` エクストラクター
//!
//! ハンドラー引数に `SocialUser` を書くと、セッションと
//! セキュリティコンテキストからログインユーザーを解決して渡す。
//!
//! ```rust,ignore
//! async fn me(SocialUser(user): SocialUser) -> Json<User> {
//!     Json(user)
//! }
//! ```

use axum::extract::FromRequestParts;
use http::request::Parts;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::User;
use crate::repositories::UserStore;
use crate::security::SecurityContext;
use crate::services::SocialUserResolver;
use crate::state::AppState;

/// 現在のソーシャルログインユーザー
#[derive(Debug, Clone)]
pub struct SocialUser(pub User);

impl FromRequestParts<AppState> for SocialUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| {
                tracing::error!(status = %status, reason = message, "セッションを取得できません");
                AppError::Internal(anyhow::anyhow!("session layer is not installed"))
            })?;

        current_user(&session, &state.resolver)
            .await?
            .map(SocialUser)
            .ok_or(AppError::Unauthenticated)
    }
}

/// セッションからユーザーを解決し、権限を再設定した場合はコンテキストを書き戻す
pub async fn current_user<S: UserStore>(
    session: &Session,
    resolver: &SocialUserResolver<S>,
) -> Result<Option<User>, AppError> {
    let context = SecurityContext::load(session).await?;
    let resolved = resolver
        .resolve(session, context.authentication.as_ref())
        .await?;

    if let Some(authentication) = resolved.authentication {
        SecurityContext::new(authentication).save(session).await?;
    }

    Ok(resolved.user)
}
