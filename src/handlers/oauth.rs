//! OAuth ソーシャルログインハンドラー
//!
//! Google / Kakao の認可リダイレクトとコールバックを処理し、
//! 取得したプロフィールを OAuth2 認証トークンとしてセッションに保存する。
//! ローカルユーザーの作成は `SocialUser` エクストラクターが初回アクセス時に行う。
//!
//! # Security
//! - state パラメータは AES-256-GCM で暗号化した CSRF トークン
//! - access_token はログに出力しない
//! - ログイン成功時にセッションIDを再発行（セッション固定攻撃対策）

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::User;
use crate::security::{Authentication, OAuth2AuthenticationToken, SecurityContext};
use crate::services::SESSION_USER_KEY;
use crate::services::oauth::{OAuthClient, generate_csrf_token, initial_authorities};
use crate::state::AppState;

/// CSRF トークンを保存するセッションキー
const OAUTH_CSRF_KEY: &str = "oauth_csrf";

/// OAuth コールバック時のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    /// OAuth プロバイダーから受け取った認可コード
    pub code: String,
    /// 暗号化された state（CSRF トークンを含む）
    pub state: String,
}

/// 認可リクエスト開始
///
/// GET /oauth2/authorization/{provider}
pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Redirect, AppError> {
    tracing::info!(provider = %provider, "OAuth 認証開始");

    let client = state.oauth_client(&provider)?;

    let csrf_token = generate_csrf_token();
    let auth_url = client.generate_auth_url(&csrf_token)?;
    session.insert(OAUTH_CSRF_KEY, &csrf_token).await?;

    tracing::debug!(provider = %provider, "OAuth 認可 URL 生成成功");
    Ok(Redirect::to(&auth_url))
}

/// OAuth コールバック処理
///
/// GET /login/oauth2/code/{provider}
///
/// # 処理フロー
/// 1. state を復号し、セッションの CSRF トークンと照合
/// 2. code でトークン交換
/// 3. access_token でプロフィール取得
/// 4. セッションIDを再発行し、以前のユーザーを破棄して OAuth2 認証トークンを保存
/// 5. ログイン成功 URL にリダイレクト
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    session: Session,
) -> Result<Redirect, AppError> {
    tracing::info!(provider = %provider, "OAuth コールバック受信");

    let client = state.oauth_client(&provider)?;

    // 1. CSRF 検証（トークンは一度きり）
    verify_csrf(&session, client, &query.state).await?;
    tracing::debug!("state 検証成功");

    // 2. code でトークン交換
    let token_response = client.exchange_code(&query.code).await?;
    tracing::debug!("トークン交換成功");

    // 3. プロフィール取得
    let attributes = client.fetch_profile(&token_response.access_token).await?;
    tracing::info!(provider = %provider, "OAuth プロフィール取得成功");

    // 4. 認証トークンをセッションへ
    let authentication = Authentication::OAuth2(OAuth2AuthenticationToken {
        attributes,
        registration_id: client.social_type().registration_id().to_string(),
        authorities: initial_authorities(token_response.scope.as_deref()),
    });

    establish_login(&session, authentication).await?;

    tracing::info!(provider = %provider, "OAuth ログイン成功");

    // 5. リダイレクト
    Ok(Redirect::to(&state.config.login_success_url))
}

/// state の CSRF トークンをセッションの値と照合（照合後トークンは削除される）
async fn verify_csrf(session: &Session, client: &OAuthClient, state: &str) -> Result<(), AppError> {
    let expected = session.remove::<String>(OAUTH_CSRF_KEY).await?;
    let received = client.decode_state(state)?;
    if expected.as_deref() != Some(received.as_str()) {
        tracing::warn!(provider = %client.social_type(), "CSRF トークン不一致");
        return Err(AppError::OAuthStateInvalid);
    }
    Ok(())
}

/// ログイン確定
///
/// 再ログイン時に前のアカウントが返らないよう、セッションのユーザーを破棄してから
/// 新しい認証を保存する
async fn establish_login(session: &Session, authentication: Authentication) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.remove::<User>(SESSION_USER_KEY).await?;
    SecurityContext::new(authentication).save(session).await?;
    Ok(())
}
