use axum::http::StatusCode;
use tower_sessions::Session;

use crate::error::AppError;

/// ログアウトハンドラー
///
/// POST /api/logout
///
/// セッション（ユーザー・セキュリティコンテキスト）を破棄する
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session.flush().await?;

    tracing::info!("ログアウト完了");

    Ok(StatusCode::NO_CONTENT)
}
