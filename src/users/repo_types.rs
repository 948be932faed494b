use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never serialized
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
