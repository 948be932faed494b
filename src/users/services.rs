use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::users::dto::{UserResponse, UserUpdate};
use crate::users::password::hash_password;
use crate::users::repo::UserStore;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Business rules over a `UserStore`: email uniqueness, existence checks,
/// password hashing. Every read goes out as the `UserResponse` projection.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserResponse>, ServiceError> {
        let user = self.store.find_by_id(id).await?;
        Ok(user.map(UserResponse::from))
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.store.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, ServiceError> {
        if self.store.find_by_email(email).await?.is_some() {
            debug!(%email, "create rejected, email taken");
            return Err(ServiceError::DuplicateEmail);
        }

        let hash = hash_password(password)?;
        let user = self.store.insert(name, email, &hash).await?;
        info!(user_id = user.id, %email, "user created");
        Ok(UserResponse::from(user))
    }

    pub async fn update(&self, id: i64, fields: UserUpdate) -> Result<bool, ServiceError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if let Some(email) = fields.email.as_deref() {
            if email != existing.email && self.store.find_by_email(email).await?.is_some() {
                debug!(user_id = id, %email, "update rejected, email in use");
                return Err(ServiceError::EmailInUse);
            }
        }

        self.store
            .update_fields(id, fields.name.as_deref(), fields.email.as_deref())
            .await
    }

    pub async fn change_password(&self, id: i64, password: &str) -> Result<bool, ServiceError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let hash = hash_password(password)?;
        let changed = self.store.update_password(id, &hash).await?;
        if changed {
            info!(user_id = id, "password changed");
        }
        Ok(changed)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound);
        }

        let deleted = self.store.delete(id).await?;
        if deleted {
            info!(user_id = id, "user deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserStore;
    use crate::users::password::verify_password;

    fn make_service() -> (UserService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        (UserService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let (service, _) = make_service();

        let created = service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Ann");
        assert_eq!(fetched.email, "a@x.com");
    }

    #[tokio::test]
    async fn create_hashes_the_password() {
        let (service, store) = make_service();

        let created = service.create("Ann", "a@x.com", "Secret1!").await.unwrap();

        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Secret1!");
        assert!(verify_password("Secret1!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let (service, _) = make_service();

        service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        let err = service.create("Bob", "a@x.com", "Other2@").await.unwrap_err();
        assert_eq!(err, ServiceError::DuplicateEmail);
    }

    #[tokio::test]
    async fn list_returns_all_projections() {
        let (service, _) = make_service();

        service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        service.create("Bob", "b@x.com", "Secret1!").await.unwrap();

        let users = service.list().await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let (service, _) = make_service();

        let err = service
            .update(999, UserUpdate { name: Some("X".into()), email: None })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn update_to_taken_email_is_rejected() {
        let (service, _) = make_service();

        service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        let bob = service.create("Bob", "b@x.com", "Secret1!").await.unwrap();

        let err = service
            .update(bob.id, UserUpdate { name: None, email: Some("a@x.com".into()) })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::EmailInUse);

        let unchanged = service.get_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "b@x.com");
    }

    #[tokio::test]
    async fn update_with_unchanged_email_succeeds() {
        let (service, _) = make_service();

        let ann = service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        let ok = service
            .update(
                ann.id,
                UserUpdate { name: Some("Anna".into()), email: Some("a@x.com".into()) },
            )
            .await
            .unwrap();
        assert!(ok);

        let fetched = service.get_by_id(ann.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Anna");
    }

    #[tokio::test]
    async fn change_password_replaces_the_hash() {
        let (service, store) = make_service();

        let ann = service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        let before = store.find_by_id(ann.id).await.unwrap().unwrap().password_hash;

        assert!(service.change_password(ann.id, "NewPass9$").await.unwrap());

        let after = store.find_by_id(ann.id).await.unwrap().unwrap().password_hash;
        assert_ne!(before, after);
        assert!(verify_password("NewPass9$", &after).unwrap());
    }

    #[tokio::test]
    async fn change_password_missing_user_is_not_found() {
        let (service, _) = make_service();
        let err = service.change_password(999, "NewPass9$").await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let (service, _) = make_service();

        let ann = service.create("Ann", "a@x.com", "Secret1!").await.unwrap();
        assert!(service.delete(ann.id).await.unwrap());
        assert!(service.get_by_id(ann.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let (service, _) = make_service();
        let err = service.delete(999).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@x.com"));
    }
}
