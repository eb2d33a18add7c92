use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::ai::client::{AiClient, GeminiClient};
use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::rate_limit::RateLimiter;
use crate::recipes::repo::{PgRecipeRepo, RecipeRepo};
use crate::users::repo::{PgUserRepo, UserRepo};

/// Everything a request needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
    pub ai: Arc<dyn AiClient>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("migrations applied");

        let ai = Arc::new(GeminiClient::new(&config.ai)) as Arc<dyn AiClient>;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgRecipeRepo::new(db)),
            ai,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        recipes: Arc<dyn RecipeRepo>,
        ai: Arc<dyn AiClient>,
    ) -> Self {
        Self {
            keys: JwtKeys::from_config(&config.jwt),
            limiter: RateLimiter::from_config(&config.rate_limit),
            config,
            users,
            recipes,
            ai,
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::config::{AiConfig, JwtConfig, RateLimitConfig};
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;

    /// AI backend that answers with a canned reply, or fails when `None`.
    pub struct FakeAi(pub Option<String>);

    #[async_trait]
    impl AiClient for FakeAi {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            match &self.0 {
                Some(answer) => Ok(format!("{answer}: {prompt}")),
                None => anyhow::bail!("upstream exploded with secret details"),
            }
        }
    }

    pub fn config(max_requests: u32) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "postgres://unused".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: None,
            },
            ai: AiConfig {
                api_key: "fake".into(),
                model: "fake".into(),
                base_url: "http://fake.local".into(),
            },
            rate_limit: RateLimitConfig {
                max_requests,
                window_secs: 60,
            },
        }
    }

    impl AppState {
        /// In-memory state: no database, a canned AI answer, generous rate limit.
        pub fn fake() -> Self {
            Self::fake_with(config(10_000), Some("chef says".into()))
        }

        pub fn fake_with(config: AppConfig, ai_answer: Option<String>) -> Self {
            let store = Arc::new(MemoryStore::default());
            Self::from_parts(
                Arc::new(config),
                store.clone(),
                store,
                Arc::new(FakeAi(ai_answer)),
            )
        }
    }
}
