use serde::Deserialize;
use uuid::Uuid;

/// Body of `POST /recipes`. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub title: String,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub duration: i64,
}

/// Body of `PUT /recipes/:id`; only supplied fields change.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<String>,
    pub duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}
