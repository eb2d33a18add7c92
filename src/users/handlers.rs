use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::ApiError,
    state::AppState,
    users::{
        dto::{UpdateProfileRequest, UserProfile},
        repo_types::ProfileUpdate,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_profile).put(update_profile))
}

/// `GET /users/:id` where `id` is a UUID or `me`. Anything unresolvable yields `null`.
#[instrument(skip(state, viewer))]
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Json<Option<UserProfile>> {
    if id == "me" {
        return Json(viewer.0.map(Into::into));
    }

    let Ok(user_id) = Uuid::parse_str(&id) else {
        return Json(None);
    };

    match state.users.find_by_id(user_id).await {
        Ok(user) => Json(user.map(Into::into)),
        Err(e) => {
            warn!(error = %e, %user_id, "profile lookup failed");
            Json(None)
        }
    }
}

/// `PUT /users/:id`: a user may only edit their own profile.
#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(payload) = payload?;
    if id != "me" && Uuid::parse_str(&id).ok() != Some(user.id) {
        return Err(ApiError::Forbidden);
    }

    let update = ProfileUpdate {
        name: non_blank("name", payload.name)?,
        country: non_blank("country", payload.country)?,
        image_url: payload.image_url.map(|s| s.trim().to_string()),
    };

    let updated = state
        .users
        .update_profile(user.id, update)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(ApiError::validation(format!("{field} must not be empty"))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_rejects_empty() {
        assert_eq!(non_blank("name", Some(" Ada ".into())).unwrap(), Some("Ada".into()));
        assert_eq!(non_blank("name", None).unwrap(), None);
        assert!(non_blank("name", Some("  ".into())).is_err());
    }
}
