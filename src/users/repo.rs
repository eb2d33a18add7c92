use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::users::repo_types::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str =
    "id, name, email, country, password_hash, recipes_contributed, image_url, date_joined";

/// Credential store.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a user. Uniqueness of `email` is enforced by the store itself.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, country, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.country)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = StoreError::from_insert(e);
                if !matches!(err, StoreError::DuplicateEmail) {
                    error!(error = %err, "failed to create user");
                }
                err
            })?;

        info!(user_id = %created.id, "user created");
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET name      = COALESCE($2, name),
                   country   = COALESCE($3, country),
                   image_url = COALESCE($4, image_url)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.country)
            .bind(update.image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    /// Runs against a real Postgres: `DATABASE_URL=... cargo test -- --ignored`.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires DATABASE_URL pointing at a scratch Postgres"]
    async fn concurrent_creates_with_same_email_admit_exactly_one() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");

        let repo = PgUserRepo::new(pool);
        let email = format!("race-{}@x.com", Uuid::new_v4());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                let email = email.clone();
                tokio::spawn(async move {
                    repo.create(NewUser {
                        name: "Ada".into(),
                        email,
                        country: "Nigeria".into(),
                        password_hash: "hash".into(),
                    })
                    .await
                })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for h in handles {
            match h.await.expect("join") {
                Ok(_) => created += 1,
                Err(StoreError::DuplicateEmail) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 3);
    }
}
