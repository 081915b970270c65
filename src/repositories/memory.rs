//! テスト用のインメモリ UserStore（呼び出し回数を記録する）

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    pub users: Arc<Mutex<Vec<User>>>,
    find_calls: Arc<AtomicUsize>,
    save_calls: Arc<AtomicUsize>,
    fail: bool,
}

impl InMemoryUserStore {
    /// すべての呼び出しが失敗するストア
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// (find_by_email, save) の呼び出し回数
    pub fn calls(&self) -> (usize, usize) {
        (
            self.find_calls.load(Ordering::SeqCst),
            self.save_calls.load(Ordering::SeqCst),
        )
    }
}

impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn save(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let saved = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            principal: user.principal.clone(),
            social_type: user.social_type,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        self.users.lock().unwrap().push(saved.clone());
        Ok(saved)
    }
}
