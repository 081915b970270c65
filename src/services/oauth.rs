use std::sync::Arc;

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::SocialType;
use crate::security::RawProfile;

/// AES-GCM nonce 長（96ビット）
const NONCE_LEN: usize = 12;

/// プロバイダごとのエンドポイント設定
#[derive(Debug, Clone, Copy)]
pub struct ProviderEndpoints {
    pub auth_url: &'static str,
    pub token_url: &'static str,
    pub userinfo_url: &'static str,
    /// 認可リクエストで要求するスコープ
    pub scopes: &'static [&'static str],
}

impl ProviderEndpoints {
    pub fn for_social_type(social_type: SocialType) -> Self {
        match social_type {
            SocialType::Google => GOOGLE_ENDPOINTS,
            SocialType::Kakao => KAKAO_ENDPOINTS,
        }
    }
}

pub const GOOGLE_ENDPOINTS: ProviderEndpoints = ProviderEndpoints {
    auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo",
    scopes: &["email", "profile"],
};

pub const KAKAO_ENDPOINTS: ProviderEndpoints = ProviderEndpoints {
    auth_url: "https://kauth.kakao.com/oauth/authorize",
    token_url: "https://kauth.kakao.com/oauth/token",
    userinfo_url: "https://kapi.kakao.com/v2/user/me",
    scopes: &["profile_nickname", "account_email"],
};

/// OAuth トークンレスポンス
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    /// 実際に許可されたスコープ（Google はスペース区切り、Kakao も同様）
    #[serde(default)]
    pub scope: Option<String>,
}

/// ソーシャルログイン用 OAuth2 クライアント
///
/// # Security
/// - client_secret はログに出力しない
/// - state パラメータは CSRF トークンを AES-256-GCM で暗号化したもの
#[derive(Clone)]
pub struct OAuthClient {
    social_type: SocialType,
    endpoints: ProviderEndpoints,
    client_id: String,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    /// Kakao はアプリ設定によっては不要
    client_secret: Option<Arc<String>>,
    redirect_uri: String,
    /// state 暗号化器（鍵は生成時に一度だけ検証）
    state_cipher: Aes256Gcm,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// 新しい OAuthClient を作成
    ///
    /// # Arguments
    /// * `social_type` - プロバイダ種別
    /// * `client_id` - OAuth クライアントID
    /// * `client_secret` - OAuth クライアントシークレット（機密情報）
    /// * `redirect_uri` - OAuth コールバック URI
    /// * `state_secret_base64` - Base64エンコードされた32バイトの暗号化キー
    pub fn new(
        social_type: SocialType,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
        state_secret_base64: &str,
    ) -> Result<Self, AppError> {
        let key_bytes = URL_SAFE_NO_PAD
            .decode(state_secret_base64)
            .or_else(|_| {
                // URL_SAFE でデコード失敗した場合、STANDARD を試す
                base64::engine::general_purpose::STANDARD.decode(state_secret_base64)
            })
            .map_err(|e| {
                tracing::error!(error = ?e, "OAuth state暗号化キーのBase64デコードエラー");
                AppError::Internal(anyhow::anyhow!("invalid state encryption key format"))
            })?;

        let state_cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| {
            tracing::error!(
                expected = 32,
                actual = key_bytes.len(),
                "OAuth state暗号化キーの長さが不正"
            );
            AppError::Internal(anyhow::anyhow!("state encryption key must be 32 bytes"))
        })?;

        Ok(Self {
            social_type,
            endpoints: ProviderEndpoints::for_social_type(social_type),
            client_id,
            client_secret: client_secret.map(Arc::new),
            redirect_uri,
            state_cipher,
            http_client: reqwest::Client::new(),
        })
    }

    pub fn social_type(&self) -> SocialType {
        self.social_type
    }

    /// 認可 URL を生成
    ///
    /// # Arguments
    /// * `csrf_token` - セッションに保存した CSRF トークン（暗号化して state に埋め込む）
    pub fn generate_auth_url(&self, csrf_token: &str) -> Result<String, AppError> {
        let encrypted_state = self.encrypt_state(csrf_token)?;
        let scope = self.endpoints.scopes.join(" ");

        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", encrypted_state.as_str()),
        ];
        if self.social_type == SocialType::Google {
            params.push(("access_type", "online"));
            params.push(("prompt", "select_account"));
        }

        let url =
            reqwest::Url::parse_with_params(self.endpoints.auth_url, &params).map_err(|e| {
                tracing::error!(error = ?e, "OAuth認可URL生成エラー");
                AppError::Internal(anyhow::anyhow!("failed to generate auth url"))
            })?;

        Ok(url.to_string())
    }

    /// 認可コードをアクセストークンに交換
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokenResponse, AppError> {
        let body = self.token_request_body(code);

        let response = self
            .http_client
            .post(self.endpoints.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, provider = %self.social_type, "トークンエンドポイント通信エラー");
                AppError::OAuthProviderError
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.social_type,
                status = %status,
                body = %body,
                "トークン交換エラー"
            );
            return Err(AppError::OAuthError(format!(
                "token exchange failed: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!(error = ?e, provider = %self.social_type, "トークンレスポンスのパースエラー");
            AppError::OAuthError("invalid token response".to_string())
        })
    }

    /// アクセストークンでプロフィールを取得（未加工のまま返す）
    pub async fn fetch_profile(&self, access_token: &str) -> Result<RawProfile, AppError> {
        let response = self
            .http_client
            .get(self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, provider = %self.social_type, "userinfo API通信エラー");
                AppError::OAuthProviderError
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(provider = %self.social_type, status = %status, "userinfo取得エラー");
            return Err(AppError::OAuthError(format!(
                "userinfo request failed: {}",
                status
            )));
        }

        response.json::<RawProfile>().await.map_err(|e| {
            tracing::error!(error = ?e, provider = %self.social_type, "userinfoレスポンスのパースエラー");
            AppError::OAuthError("invalid userinfo response".to_string())
        })
    }

    /// application/x-www-form-urlencoded 形式のトークンリクエスト
    fn token_request_body(&self, code: &str) -> String {
        let mut body = format!(
            "grant_type=authorization_code&client_id={}&code={}&redirect_uri={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_uri),
        );
        if let Some(secret) = &self.client_secret {
            body.push_str("&client_secret=");
            body.push_str(&urlencoding::encode(secret.as_str()));
        }
        body
    }

    /// CSRF トークンを AES-256-GCM で暗号化し、nonce と連結して Base64 URL-safe エンコード
    fn encrypt_state(&self, csrf_token: &str) -> Result<String, AppError> {
        let mut combined = vec![0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut combined);

        let ciphertext = self
            .state_cipher
            .encrypt(Nonce::from_slice(&combined), csrf_token.as_bytes())
            .map_err(|e| {
                tracing::error!(error = ?e, "state暗号化エラー");
                AppError::Internal(anyhow::anyhow!("state encryption error"))
            })?;
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    /// state パラメータを復号して CSRF トークンを取り出す
    ///
    /// 改ざん・別キーでの暗号化はすべて `OAuthStateInvalid`
    pub fn decode_state(&self, state: &str) -> Result<String, AppError> {
        let encrypted = URL_SAFE_NO_PAD.decode(state).map_err(|e| {
            tracing::warn!(error = ?e, "state Base64デコードエラー");
            AppError::OAuthStateInvalid
        })?;

        if encrypted.len() < NONCE_LEN {
            tracing::warn!(len = encrypted.len(), "暗号化stateが短すぎる");
            return Err(AppError::OAuthStateInvalid);
        }
        let (nonce, ciphertext) = encrypted.split_at(NONCE_LEN);

        let plaintext = self
            .state_cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| {
                tracing::warn!(error = ?e, "state復号エラー");
                AppError::OAuthStateInvalid
            })?;

        String::from_utf8(plaintext).map_err(|_| AppError::OAuthStateInvalid)
    }
}

/// CSRF トークンを生成（32バイト乱数の Base64 URL-safe）
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンレスポンスのスコープから権限一覧を組み立てる
///
/// "ROLE_USER" に加えて、許可されたスコープごとに "SCOPE_xxx" を付与する
pub fn initial_authorities(scope: Option<&str>) -> Vec<String> {
    let mut authorities = vec!["ROLE_USER".to_string()];
    if let Some(scope) = scope {
        authorities.extend(
            scope
                .split([' ', ','])
                .filter(|s| !s.is_empty())
                .map(|s| format!("SCOPE_{s}")),
        );
    }
    authorities
}
