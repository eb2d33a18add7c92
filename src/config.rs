use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// `None` means tokens carry no `exp` claim and never expire.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid APP_PORT: {}", e))?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gaia".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gaia-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok())?,
        };
        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
        };
        let rate_limit = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(100),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(15 * 60),
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url,
            jwt,
            ai,
            rate_limit,
        })
    }
}

/// Unset or blank means no expiry; anything else must be a positive minute count.
fn parse_ttl_minutes(raw: Option<String>) -> anyhow::Result<Option<i64>> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(m) if m > 0 => Ok(Some(m)),
        _ => anyhow::bail!("invalid JWT_TTL_MINUTES {raw:?}: expected a positive number of minutes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_unset_or_blank_disables_expiry() {
        assert_eq!(parse_ttl_minutes(None).unwrap(), None);
        assert_eq!(parse_ttl_minutes(Some("  ".into())).unwrap(), None);
    }

    #[test]
    fn ttl_accepts_positive_minutes() {
        assert_eq!(parse_ttl_minutes(Some("1440".into())).unwrap(), Some(1440));
        assert_eq!(parse_ttl_minutes(Some(" 5 ".into())).unwrap(), Some(5));
    }

    #[test]
    fn ttl_rejects_malformed_or_non_positive_values() {
        for raw in ["0", "-5", "1d", "abc"] {
            assert!(parse_ttl_minutes(Some(raw.into())).is_err(), "{raw}");
        }
    }
}
