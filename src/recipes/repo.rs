use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::recipes::repo_types::{
    NewRecipe, Recipe, RecipeAuthorRow, RecipeUpdate, RecipeWithAuthor,
};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, image_url, ingredients, instructions, duration, date_posted";

const JOINED_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.title, r.image_url, r.ingredients, r.instructions,
           r.duration, r.date_posted,
           u.id AS author_id, u.name AS author_name, u.country AS author_country,
           u.image_url AS author_image_url
      FROM recipes r
      LEFT JOIN users u ON u.id = r.user_id
"#;

/// Recipe store.
#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Inserts a recipe and bumps the owner's `recipes_contributed`.
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, StoreError>;
    /// All recipes, newest first, with the owner summary joined.
    async fn find_all(&self) -> Result<Vec<RecipeWithAuthor>, StoreError>;
    /// Case-insensitive substring match on the title. Blank keywords match nothing.
    async fn search(&self, keyword: &str) -> Result<Vec<RecipeWithAuthor>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RecipeWithAuthor>, StoreError>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RecipeWithAuthor>, StoreError>;
    async fn update(&self, id: Uuid, update: RecipeUpdate) -> Result<Option<Recipe>, StoreError>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgRecipeRepo {
    pool: PgPool,
}

impl PgRecipeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so the keyword is matched literally.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len() + 2);
    out.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO recipes (id, user_id, title, image_url, ingredients, instructions, duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RECIPE_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Recipe>(&sql)
            .bind(Uuid::new_v4())
            .bind(recipe.user_id)
            .bind(&recipe.title)
            .bind(&recipe.image_url)
            .bind(&recipe.ingredients)
            .bind(&recipe.instructions)
            .bind(recipe.duration)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET recipes_contributed = recipes_contributed + 1 WHERE id = $1")
            .bind(recipe.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(recipe_id = %created.id, user_id = %created.user_id, "recipe created");
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let sql = format!("{JOINED_SELECT} ORDER BY r.date_posted DESC");
        let rows = sqlx::query_as::<_, RecipeAuthorRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"{JOINED_SELECT} WHERE r.title ILIKE $1 ESCAPE '\' ORDER BY r.date_posted DESC"#
        );
        let rows = sqlx::query_as::<_, RecipeAuthorRow>(&sql)
            .bind(like_pattern(keyword))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RecipeWithAuthor>, StoreError> {
        let sql = format!("{JOINED_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, RecipeAuthorRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let sql = format!("{JOINED_SELECT} WHERE r.user_id = $1 ORDER BY r.date_posted DESC");
        let rows = sqlx::query_as::<_, RecipeAuthorRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, update: RecipeUpdate) -> Result<Option<Recipe>, StoreError> {
        let sql = format!(
            r#"
            UPDATE recipes
               SET title        = COALESCE($2, title),
                   image_url    = COALESCE($3, image_url),
                   ingredients  = COALESCE($4, ingredients),
                   instructions = COALESCE($5, instructions),
                   duration     = COALESCE($6, duration)
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        );
        let recipe = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .bind(update.title)
            .bind(update.image_url)
            .bind(update.ingredients)
            .bind(update.instructions)
            .bind(update.duration)
            .fetch_optional(&self.pool)
            .await?;
        Ok(recipe)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
