use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // OAuth2 ソーシャルログイン設定
    /// OAuthステート暗号化用シークレット（必須、Base64 32バイト）
    pub oauth_state_secret: SecretBox<String>,
    /// ログイン成功後のリダイレクト先
    #[serde(default = "default_login_success_url")]
    pub login_success_url: String,

    // Google OAuth設定（オプション）
    #[serde(default)]
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<SecretBox<String>>,
    #[serde(default)]
    pub google_redirect_uri: Option<String>,

    // Kakao OAuth設定（オプション、client_secret はアプリ設定次第）
    #[serde(default)]
    pub kakao_client_id: Option<String>,
    pub kakao_client_secret: Option<SecretBox<String>>,
    #[serde(default)]
    pub kakao_redirect_uri: Option<String>,

    // セッション設定
    #[serde(default)]
    pub session_cookie_secure: bool,
    /// 無操作でセッションが失効するまでの秒数
    #[serde(default = "default_session_inactivity_secs")]
    pub session_inactivity_secs: i64,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOGIN_SUCCESS_URL: &str = "/api/me";
const DEFAULT_SESSION_INACTIVITY_SECS: i64 = 3600;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_login_success_url() -> String {
    DEFAULT_LOGIN_SUCCESS_URL.to_string()
}

fn default_session_inactivity_secs() -> i64 {
    DEFAULT_SESSION_INACTIVITY_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
