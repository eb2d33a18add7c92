use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    recipes::{
        dto::{CreateRecipeRequest, SearchQuery, UpdateRecipeRequest},
        repo_types::{Recipe, RecipeWithAuthor},
        services,
    },
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/search", get(search_recipes))
        .route("/recipes/user/:user_id", get(list_user_recipes))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

// --- handlers ---

/// Feed: every recipe with its author summary. Requires a valid token.
#[instrument(skip(state, user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeWithAuthor>>, ApiError> {
    let recipes = state.recipes.find_all().await?;
    info!(user_id = %user.id, count = recipes.len(), "recipes listed");
    Ok(Json(recipes))
}

#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let Json(payload) = payload?;
    let new = services::new_recipe(payload, user.id)?;
    let recipe = state.recipes.create(new).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn search_recipes(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<RecipeWithAuthor>>, ApiError> {
    let recipes = state.recipes.search(&q.keyword).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RecipeWithAuthor>, ApiError> {
    let Path(id) = id?;
    state
        .recipes
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Recipe"))
}

#[instrument(skip(state))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<RecipeWithAuthor>>, ApiError> {
    let Path(user_id) = user_id?;
    let recipes = state.recipes.find_by_user(user_id).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state, user, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRecipeRequest>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let Path(id) = id?;
    ensure_owner(&state, id, user.id).await?;
    let Json(payload) = payload?;
    let update = services::recipe_update(payload)?;

    let recipe = state
        .recipes
        .update(id, update)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;
    info!(recipe_id = %id, user_id = %user.id, "recipe updated");
    Ok(Json(recipe))
}

#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    ensure_owner(&state, id, user.id).await?;
    if !state.recipes.delete(id).await? {
        return Err(ApiError::NotFound("Recipe"));
    }
    info!(recipe_id = %id, user_id = %user.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_owner(state: &AppState, recipe_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let recipe = state
        .recipes
        .find_by_id(recipe_id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;
    if recipe.user_id != user_id {
        warn!(%recipe_id, %user_id, owner = %recipe.user_id, "not the recipe owner");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}
