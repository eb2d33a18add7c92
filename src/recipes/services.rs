use uuid::Uuid;

use crate::error::ApiError;
use crate::recipes::dto::{CreateRecipeRequest, UpdateRecipeRequest};
use crate::recipes::repo_types::{NewRecipe, RecipeUpdate};

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(v.to_string())
}

fn clean_ingredients(ingredients: &[String]) -> Result<Vec<String>, ApiError> {
    let cleaned: Vec<String> = ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect();
    if cleaned.is_empty() {
        return Err(ApiError::validation("at least one ingredient is required"));
    }
    Ok(cleaned)
}

fn valid_duration(minutes: i64) -> Result<i32, ApiError> {
    if minutes <= 0 {
        return Err(ApiError::validation("duration must be a positive number of minutes"));
    }
    i32::try_from(minutes).map_err(|_| ApiError::validation("duration is too large"))
}

/// Builds the insert for `owner`. A `userId` in the body must name the same user.
pub fn new_recipe(req: CreateRecipeRequest, owner: Uuid) -> Result<NewRecipe, ApiError> {
    if let Some(claimed) = req.user_id {
        if claimed != owner {
            return Err(ApiError::validation(
                "userId does not match the authenticated user",
            ));
        }
    }
    Ok(NewRecipe {
        user_id: owner,
        title: required("title", &req.title)?,
        image_url: required("imageUrl", &req.image_url)?,
        ingredients: clean_ingredients(&req.ingredients)?,
        instructions: required("instructions", &req.instructions)?,
        duration: valid_duration(req.duration)?,
    })
}

pub fn recipe_update(req: UpdateRecipeRequest) -> Result<RecipeUpdate, ApiError> {
    Ok(RecipeUpdate {
        title: req.title.as_deref().map(|v| required("title", v)).transpose()?,
        image_url: req
            .image_url
            .as_deref()
            .map(|v| required("imageUrl", v))
            .transpose()?,
        ingredients: req.ingredients.as_deref().map(clean_ingredients).transpose()?,
        instructions: req
            .instructions
            .as_deref()
            .map(|v| required("instructions", v))
            .transpose()?,
        duration: req.duration.map(valid_duration).transpose()?,
    })
}
