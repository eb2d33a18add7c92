use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::dto::{LoginRequest, SignupRequest};
use crate::auth::password::{
    hash_password_off_thread, verify_against_dummy_off_thread, verify_password_off_thread,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::{NewUser, User};

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and checks a signup request in place.
pub(crate) fn validate_signup(req: &mut SignupRequest) -> Result<(), ApiError> {
    req.name = req.name.trim().to_string();
    req.country = req.country.trim().to_string();
    req.email = normalize_email(&req.email);

    if req.name.is_empty() || req.country.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Please provide all the required fields!"));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::validation("Invalid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates the user and issues its first token.
pub async fn signup(state: &AppState, mut req: SignupRequest) -> Result<(String, User), ApiError> {
    validate_signup(&mut req)?;

    // Fast path for a friendlier error; the unique constraint is the real guard.
    if state.users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password_off_thread(req.password)
        .await
        .map_err(ApiError::Internal)?;
    let user = state
        .users
        .create(NewUser {
            name: req.name,
            email: req.email,
            country: req.country,
            password_hash,
        })
        .await?;

    let token = state.keys.issue(user.id).map_err(ApiError::Internal)?;
    info!(user_id = %user.id, "user signed up");
    Ok((token, user))
}

/// Checks credentials. Unknown email and wrong password fail identically.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<(String, User), ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Please provide all the required fields!"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_against_dummy_off_thread(req.password).await;
        warn!("login with unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = verify_password_off_thread(req.password, user.password_hash.clone())
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, user_id = %user.id, "stored hash unreadable");
            false
        });
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.keys.issue(user.id).map_err(ApiError::Internal)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str, email: &str, password: &str, country: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            country: country.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("u@x.com"));
        assert!(!is_valid_email("u@x"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn signup_validation_normalizes_fields() {
        let mut r = req("  Ada ", " U@X.com ", "correct", " Nigeria ");
        validate_signup(&mut r).expect("valid");
        assert_eq!(r.name, "Ada");
        assert_eq!(r.email, "u@x.com");
        assert_eq!(r.country, "Nigeria");
    }

    #[test]
    fn signup_validation_rejects_missing_or_bad_fields() {
        for mut r in [
            req("", "u@x.com", "correct", "Nigeria"),
            req("Ada", "u@x.com", "correct", "   "),
            req("Ada", "u@x.com", "", "Nigeria"),
            req("Ada", "nope", "correct", "Nigeria"),
            req("Ada", "u@x.com", "short", "Nigeria"),
        ] {
            let err = validate_signup(&mut r).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{err:?}");
        }
    }
}
