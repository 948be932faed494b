use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ServiceError;
use crate::users::repo_types::User;

/// Storage contract for the users table. Absence is `Ok(None)` /
/// `Ok(false)`, never an error; I/O failures surface as
/// `ServiceError::Storage`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    async fn find_all(&self) -> Result<Vec<User>, ServiceError>;

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ServiceError>;

    /// Update name and/or email. Returns whether a row was affected.
    async fn update_fields(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ServiceError>;

    async fn update_password(&self, id: i64, password_hash: &str)
        -> Result<bool, ServiceError>;

    async fn delete(&self, id: i64) -> Result<bool, ServiceError>;
}

/// PostgreSQL-backed store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ServiceError> {
        // The UNIQUE constraint on email is the backstop for creates racing
        // past the service-level pre-check; a violation surfaces as
        // DuplicateEmail via the From<sqlx::Error> mapping.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_fields(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| match ServiceError::from(e) {
            // In the update context a unique violation means the target
            // email belongs to another row.
            ServiceError::DuplicateEmail => ServiceError::EmailInUse,
            other => other,
        })?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
