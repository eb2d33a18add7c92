use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;

/// Signing and verification keys with the claim values they enforce.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Option<Duration>,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: cfg
                .ttl_minutes
                .map(|m| Duration::from_secs((m.max(0) as u64) * 60)),
        }
    }

    pub fn expires(&self) -> bool {
        self.ttl.is_some()
    }

    /// Signs a session token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = self
            .ttl
            .map(|ttl| (now + TimeDuration::seconds(ttl.as_secs() as i64)).unix_timestamp() as usize);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt issued");
        Ok(token)
    }

    /// Checks signature, issuer and audience. With a TTL configured `exp` is
    /// mandatory, so tokens minted before expiry was enabled stop working.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.expires() {
            validation.set_required_spec_claims(&["sub", "iss", "aud", "exp"]);
        } else {
            validation.set_required_spec_claims(&["sub", "iss", "aud"]);
        }
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
