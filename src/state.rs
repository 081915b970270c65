use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::models::SocialType;
use crate::repositories::UserRepository;
use crate::services::{OAuthClient, SocialUserResolver};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ソーシャルログインユーザーのリゾルバ
    pub resolver: SocialUserResolver<UserRepository>,
    /// Google OAuth クライアント（設定されている場合のみ）
    pub google_oauth: Option<OAuthClient>,
    /// Kakao OAuth クライアント（設定されている場合のみ）
    pub kakao_oauth: Option<OAuthClient>,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let resolver = SocialUserResolver::new(UserRepository::new(db_pool));

        // Google OAuth（3項目すべて設定されている場合のみ初期化）
        let google_oauth = match (
            &config.google_client_id,
            &config.google_client_secret,
            &config.google_redirect_uri,
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
                tracing::info!("Google OAuth クライアントを初期化");
                Some(OAuthClient::new(
                    SocialType::Google,
                    client_id.clone(),
                    Some(client_secret.expose_secret().clone()),
                    redirect_uri.clone(),
                    config.oauth_state_secret.expose_secret(),
                )?)
            }
            _ => {
                tracing::info!("Google OAuth 未設定（スキップ）");
                None
            }
        };

        // Kakao OAuth（client_secret は任意）
        let kakao_oauth = match (&config.kakao_client_id, &config.kakao_redirect_uri) {
            (Some(client_id), Some(redirect_uri)) => {
                tracing::info!("Kakao OAuth クライアントを初期化");
                Some(OAuthClient::new(
                    SocialType::Kakao,
                    client_id.clone(),
                    config
                        .kakao_client_secret
                        .as_ref()
                        .map(|s| s.expose_secret().clone()),
                    redirect_uri.clone(),
                    config.oauth_state_secret.expose_secret(),
                )?)
            }
            _ => {
                tracing::info!("Kakao OAuth 未設定（スキップ）");
                None
            }
        };

        Ok(Self {
            config,
            resolver,
            google_oauth,
            kakao_oauth,
        })
    }

    /// 登録IDに対応する OAuth クライアント
    ///
    /// # Errors
    /// 未対応または未設定のプロバイダは `AppError::UnsupportedProvider`
    pub fn oauth_client(&self, registration_id: &str) -> Result<&OAuthClient, AppError> {
        let client = match registration_id.parse::<SocialType>()? {
            SocialType::Google => self.google_oauth.as_ref(),
            SocialType::Kakao => self.kakao_oauth.as_ref(),
        };

        client.ok_or_else(|| {
            tracing::warn!(provider = %registration_id, "OAuth プロバイダが設定されていません");
            AppError::UnsupportedProvider(registration_id.to_string())
        })
    }
}
