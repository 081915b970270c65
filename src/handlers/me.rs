use axum::Json;

use crate::extractors::SocialUser;
use crate::models::User;

/// ログイン中ユーザー取得ハンドラー
///
/// GET /api/me
///
/// 未ログインの場合は 401 を返す（`SocialUser` の拒否レスポンス）
pub async fn me(SocialUser(user): SocialUser) -> Json<User> {
    tracing::debug!(user_id = %user.id, "ログイン中ユーザーを返却");
    Json(user)
}
