use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// ログインに使用できるプロバイダ（登録ID）
    pub providers: Vec<&'static str>,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = [&state.google_oauth, &state.kakao_oauth]
        .into_iter()
        .flatten()
        .map(|client| client.social_type().registration_id())
        .collect();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        providers,
    })
}
