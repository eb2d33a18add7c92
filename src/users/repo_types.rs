use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Never serialized directly: see `users::dto`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub country: String,
    pub password_hash: String, // argon2 PHC string
    pub recipes_contributed: i32,
    pub image_url: Option<String>,
    pub date_joined: OffsetDateTime,
}

/// Input for `UserRepo::create`; id and join date are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub country: String,
    pub password_hash: String,
}

/// Partial profile change. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub image_url: Option<String>,
}
