use time::OffsetDateTime;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::User;
use crate::repositories::UserStore;
use crate::security::{Authentication, PreauthenticatedToken};
use crate::services::profile::ProviderProfile;

/// ログインユーザーを保存するセッションキー
pub const SESSION_USER_KEY: &str = "user";

/// 解決結果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// 解決されたユーザー（OAuth2 以外の認証・未ログインなら None）
    pub user: Option<User>,
    /// 権限を再設定した場合の新しい認証（変更なしなら None）
    pub authentication: Option<Authentication>,
}

impl Resolved {
    fn unchanged(user: Option<User>) -> Self {
        Self {
            user,
            authentication: None,
        }
    }
}

/// ソーシャルログインユーザーのリゾルバ
///
/// 処理フロー:
/// 1. セッションに "user" があればそのまま返す
/// 2. 認証が OAuth2 トークンでなければ何もせず返す
/// 3. 登録IDごとにプロフィールを変換
/// 4. email で既存ユーザーを検索、なければ保存
/// 5. ロールが権限に含まれていなければ認証を差し替え
/// 6. セッションに "user" を保存
#[derive(Clone)]
pub struct SocialUserResolver<S> {
    users: S,
}

impl<S: UserStore> SocialUserResolver<S> {
    pub fn new(users: S) -> Self {
        Self { users }
    }

    pub async fn resolve(
        &self,
        session: &Session,
        authentication: Option<&Authentication>,
    ) -> Result<Resolved, AppError> {
        // 1. セッションヒット
        let session_user = session.get::<User>(SESSION_USER_KEY).await?;
        if session_user.is_some() {
            return Ok(Resolved::unchanged(session_user));
        }

        // 2. OAuth2 以外（未ログイン・差し替え済みトークン）はこの経路の対象外
        let Some(token) = authentication.and_then(Authentication::as_oauth2) else {
            tracing::debug!("OAuth2 認証なし - ユーザー解決をスキップ");
            return Ok(Resolved::unchanged(None));
        };

        // 3. プロフィール変換
        let profile = ProviderProfile::parse(&token.registration_id, &token.attributes)?;
        let new_user = profile.into_new_user(OffsetDateTime::now_utc());

        // 4. 検索または作成
        // NOTE: 検索と作成はアトミックではない（同時初回ログインは UNIQUE 制約違反になる）
        let user = match self.users.find_by_email(&new_user.email).await? {
            Some(existing) => {
                tracing::debug!(user_id = %existing.id, "既存ユーザーを使用");
                existing
            }
            None => {
                let created = self.users.save(&new_user).await?;
                tracing::info!(
                    provider = %created.social_type,
                    user_id = %created.id,
                    "新規ソーシャルユーザーを作成"
                );
                created
            }
        };

        // 5. 権限の再設定
        let replaced = if token.authorities.iter().any(|a| a == user.role()) {
            None
        } else {
            tracing::debug!(role = user.role(), "認証の権限を再設定");
            Some(Authentication::Preauthenticated(PreauthenticatedToken::new(
                token.attributes.clone(),
                vec![user.role().to_string()],
            )))
        };

        // 6. セッション保存
        session.insert(SESSION_USER_KEY, &user).await?;

        Ok(Resolved {
            user: Some(user),
            authentication: replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};
    use tower_sessions::MemoryStore;
    use uuid::Uuid;

    use super::*;
    use crate::models::SocialType;
    use crate::repositories::memory::InMemoryUserStore;
    use crate::security::{OAuth2AuthenticationToken, RawProfile};

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn oauth2(registration_id: &str, attributes: Value, authorities: &[&str]) -> Authentication {
        let Value::Object(attributes) = attributes else {
            panic!("object expected");
        };
        Authentication::OAuth2(OAuth2AuthenticationToken {
            attributes,
            registration_id: registration_id.to_string(),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
        })
    }

    fn google_alice() -> Authentication {
        oauth2(
            "google",
            json!({ "name": "Alice", "email": "alice@x.com", "id": "g1" }),
            &["ROLE_USER", "SCOPE_email"],
        )
    }

    fn kakao_bob() -> Authentication {
        oauth2(
            "kakao",
            json!({
                "id": "k1",
                "properties": { "nickname": "Bob" },
                "kakao_account": { "email": "bob@y.com" }
            }),
            &["ROLE_USER"],
        )
    }

    #[tokio::test]
    async fn test_session_hit_returns_user_without_store_access() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());
        let session = new_session();

        let cached = User {
            id: Uuid::new_v4(),
            name: "Cached".to_string(),
            email: "cached@x.com".to_string(),
            principal: "c1".to_string(),
            social_type: SocialType::Google,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: Some(OffsetDateTime::UNIX_EPOCH),
        };
        session.insert(SESSION_USER_KEY, &cached).await.unwrap();

        let resolved = resolver
            .resolve(&session, Some(&google_alice()))
            .await
            .unwrap();

        assert_eq!(resolved.user, Some(cached));
        assert!(resolved.authentication.is_none());
        assert_eq!(store.calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_no_authentication_returns_none() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());
        let session = new_session();

        let resolved = resolver.resolve(&session, None).await.unwrap();

        assert_eq!(resolved, Resolved::unchanged(None));
        assert_eq!(store.calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_non_oauth2_authentication_is_silent_fallback() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());
        let session = new_session();
        let auth = Authentication::Preauthenticated(PreauthenticatedToken::new(
            RawProfile::new(),
            vec!["ROLE_GOOGLE".to_string()],
        ));

        let resolved = resolver.resolve(&session, Some(&auth)).await.unwrap();

        assert!(resolved.user.is_none());
        assert!(resolved.authentication.is_none());
        assert_eq!(store.calls(), (0, 0));
        assert!(
            session
                .get::<User>(SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_google_first_login_creates_user() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());
        let session = new_session();

        let resolved = resolver
            .resolve(&session, Some(&google_alice()))
            .await
            .unwrap();
        let user = resolved.user.unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.principal, "g1");
        assert_eq!(user.social_type, SocialType::Google);
        assert_eq!(user.updated_at, Some(user.created_at));
        assert_eq!(store.calls(), (1, 1));

        // セッションに保存されている
        let stored = session.get::<User>(SESSION_USER_KEY).await.unwrap();
        assert_eq!(stored, Some(user));
    }

    #[tokio::test]
    async fn test_repeated_login_reuses_persisted_user() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());

        let first = resolver
            .resolve(&new_session(), Some(&google_alice()))
            .await
            .unwrap()
            .user
            .unwrap();
        let second = resolver
            .resolve(&new_session(), Some(&google_alice()))
            .await
            .unwrap()
            .user
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.users.lock().unwrap().len(), 1);
        assert_eq!(store.calls(), (2, 1));
    }

    #[tokio::test]
    async fn test_existing_record_wins_over_fresh_mapping() {
        let store = InMemoryUserStore::default();
        let existing = User {
            id: Uuid::new_v4(),
            name: "Alice (stored)".to_string(),
            email: "alice@x.com".to_string(),
            principal: "g1".to_string(),
            social_type: SocialType::Google,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        };
        store.users.lock().unwrap().push(existing.clone());
        let resolver = SocialUserResolver::new(store.clone());

        let resolved = resolver
            .resolve(&new_session(), Some(&google_alice()))
            .await
            .unwrap();

        assert_eq!(resolved.user, Some(existing));
        assert_eq!(store.calls(), (1, 0));
    }

    #[tokio::test]
    async fn test_kakao_login_leaves_updated_at_unset() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store);

        let user = resolver
            .resolve(&new_session(), Some(&kakao_bob()))
            .await
            .unwrap()
            .user
            .unwrap();

        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "bob@y.com");
        assert_eq!(user.principal, "k1");
        assert_eq!(user.social_type, SocialType::Kakao);
        assert!(user.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_missing_role_replaces_authentication() {
        let resolver = SocialUserResolver::new(InMemoryUserStore::default());
        let auth = kakao_bob();

        let resolved = resolver
            .resolve(&new_session(), Some(&auth))
            .await
            .unwrap();

        let Some(Authentication::Preauthenticated(token)) = resolved.authentication else {
            panic!("authentication should be replaced");
        };
        assert_eq!(token.authorities, vec!["ROLE_KAKAO".to_string()]);
        assert_eq!(token.credentials, "N/A");
        assert_eq!(Some(&token.principal), auth.as_oauth2().map(|t| &t.attributes));
    }

    #[tokio::test]
    async fn test_present_role_keeps_authentication() {
        let resolver = SocialUserResolver::new(InMemoryUserStore::default());
        let auth = oauth2(
            "google",
            json!({ "name": "Alice", "email": "alice@x.com", "id": "g1" }),
            &["ROLE_USER", "ROLE_GOOGLE"],
        );

        let resolved = resolver
            .resolve(&new_session(), Some(&auth))
            .await
            .unwrap();

        assert!(resolved.user.is_some());
        assert!(resolved.authentication.is_none());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_explicit_error() {
        let store = InMemoryUserStore::default();
        let resolver = SocialUserResolver::new(store.clone());
        let session = new_session();
        let auth = oauth2(
            "facebook",
            json!({ "name": "Carol", "email": "carol@z.com", "id": "f1" }),
            &["ROLE_USER"],
        );

        let result = resolver.resolve(&session, Some(&auth)).await;

        assert!(matches!(result, Err(AppError::UnsupportedProvider(p)) if p == "facebook"));
        assert_eq!(store.calls(), (0, 0));
        assert!(
            session
                .get::<User>(SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let resolver = SocialUserResolver::new(InMemoryUserStore::failing());
        let session = new_session();

        let result = resolver.resolve(&session, Some(&google_alice())).await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(
            session
                .get::<User>(SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }
}
