use std::future::Future;

use sqlx::PgPool;

use crate::models::{NewUser, User};

/// ユーザー永続化の境界
///
/// リゾルバはこのトレイト越しにのみユーザーを読み書きする
pub trait UserStore: Send + Sync {
    /// メールアドレスでユーザーを検索
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, sqlx::Error>> + Send;

    /// 新しいユーザーを保存し、生成された id を含むレコードを返す
    fn save(&self, user: &NewUser) -> impl Future<Output = Result<User, sqlx::Error>> + Send;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for UserRepository {
    /// # Note
    /// DB セットアップ後は `query_as!` マクロに変更してコンパイル時SQL検証を有効にすること
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, principal, social_type, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   同一メールアドレスでの同時初回ログインで発生しうる
    async fn save(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, principal, social_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, principal, social_type, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.principal)
        .bind(user.social_type)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
    }
}
