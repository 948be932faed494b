use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// In-memory store used by tests and `AppState::fake()`. Enforces the
/// same email-uniqueness contract as the Postgres schema.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ServiceError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == email) {
            return Err(ServiceError::DuplicateEmail);
        }

        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: inner.next_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_fields(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&id) {
            return Ok(false);
        }
        if let Some(email) = email {
            if inner.users.values().any(|u| u.email == email && u.id != id) {
                return Err(ServiceError::EmailInUse);
            }
        }

        let user = inner.users.get_mut(&id).expect("checked above");
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, ServiceError> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.remove(&id).is_some())
    }
}
