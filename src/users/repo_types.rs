use serde::Serialize;
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // argon2 PHC string, never exposed in JSON
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Row to insert; `id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub hashed_password: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// The mutable part of a profile; email and password are immutable.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
