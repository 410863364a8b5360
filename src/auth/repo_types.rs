use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                        // stable user ID
    pub username: String,                // unique, 4-20 chars
    #[serde(skip_serializing)]
    pub password_hash: String,           // Argon2 hash, not exposed in JSON
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub dob: Date,
    pub profile_picture: Option<String>, // blob store key
    pub created_at: OffsetDateTime,
}

/// Everything needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub dob: Date,
    pub profile_picture: Option<String>,
}
