use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::UnknownSocialType;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("未ログイン")]
    Unauthenticated,

    #[error("未対応のプロバイダー: {0}")]
    UnsupportedProvider(String),

    #[error("プロバイダーのプロフィール形式が不正 ({provider}): {reason}")]
    MalformedProfile { provider: String, reason: String },

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("セッションエラー")]
    Session(#[from] tower_sessions::session::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("OAuth認証エラー: {0}")]
    OAuthError(String),

    #[error("無効なstateパラメータ")]
    OAuthStateInvalid,

    #[error("OAuthプロバイダーエラー")]
    OAuthProviderError,
}

impl From<UnknownSocialType> for AppError {
    fn from(e: UnknownSocialType) -> Self {
        Self::UnsupportedProvider(e.0)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "ログインが必要です".to_string()),
            Self::UnsupportedProvider(provider) => {
                tracing::warn!(provider = %provider, "未対応のプロバイダー");
                (
                    StatusCode::BAD_REQUEST,
                    "未対応のログインプロバイダーです".to_string(),
                )
            }
            Self::MalformedProfile { provider, reason } => {
                tracing::error!(provider = %provider, reason = %reason, "プロフィール形式エラー");
                (
                    StatusCode::BAD_GATEWAY,
                    "外部認証サービスの応答が不正です".to_string(),
                )
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Session(e) => {
                tracing::error!(error = ?e, "セッションエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::OAuthError(e) => {
                tracing::error!(error = %e, "OAuth認証エラー");
                (StatusCode::UNAUTHORIZED, "認証に失敗しました".to_string())
            }
            Self::OAuthStateInvalid => {
                tracing::warn!("無効なOAuth stateパラメータ（CSRF攻撃の可能性）");
                (StatusCode::BAD_REQUEST, "無効なリクエストです".to_string())
            }
            Self::OAuthProviderError => (
                StatusCode::BAD_GATEWAY,
                "外部認証サービスとの通信に失敗しました".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
