use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Recipe record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub duration: i32, // minutes
    #[serde(with = "time::serde::rfc3339")]
    pub date_posted: OffsetDateTime,
}

/// Owner summary joined into listings. Email is deliberately absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAuthor {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub image_url: Option<String>,
}

/// A recipe with its owner's summary; `user` is null when the owner is gone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWithAuthor {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub user: Option<RecipeAuthor>,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_posted: OffsetDateTime,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub duration: i32,
}

impl RecipeWithAuthor {
    pub fn new(r: Recipe, user: Option<RecipeAuthor>) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            user,
            title: r.title,
            date_posted: r.date_posted,
            image_url: r.image_url,
            ingredients: r.ingredients,
            instructions: r.instructions,
            duration: r.duration,
        }
    }
}

/// Flat row of `recipes LEFT JOIN users`.
#[derive(Debug, FromRow)]
pub struct RecipeAuthorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub duration: i32,
    pub date_posted: OffsetDateTime,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub author_country: Option<String>,
    pub author_image_url: Option<String>,
}

impl From<RecipeAuthorRow> for RecipeWithAuthor {
    fn from(r: RecipeAuthorRow) -> Self {
        let user = match (r.author_id, r.author_name, r.author_country) {
            (Some(id), Some(name), Some(country)) => Some(RecipeAuthor {
                id,
                name,
                country,
                image_url: r.author_image_url,
            }),
            _ => None,
        };
        let recipe = Recipe {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            image_url: r.image_url,
            ingredients: r.ingredients,
            instructions: r.instructions,
            duration: r.duration,
            date_posted: r.date_posted,
        };
        RecipeWithAuthor::new(recipe, user)
    }
}

/// Input for `RecipeRepo::create`; id and post date are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub user_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub duration: i32,
}

/// Keyed partial replace. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<String>,
    pub duration: Option<i32>,
}
