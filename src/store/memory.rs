use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::recipes::repo::RecipeRepo;
use crate::recipes::repo_types::{NewRecipe, Recipe, RecipeAuthor, RecipeUpdate, RecipeWithAuthor};
use crate::users::repo::UserRepo;
use crate::users::repo_types::{NewUser, ProfileUpdate, User};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    recipes: Vec<Recipe>,
}

impl Inner {
    fn author(&self, user_id: Uuid) -> Option<RecipeAuthor> {
        self.users.iter().find(|u| u.id == user_id).map(|u| RecipeAuthor {
            id: u.id,
            name: u.name.clone(),
            country: u.country.clone(),
            image_url: u.image_url.clone(),
        })
    }

    /// Newest first, matching the Postgres ordering.
    fn joined<'a>(&self, recipes: impl Iterator<Item = &'a Recipe>) -> Vec<RecipeWithAuthor> {
        let mut out: Vec<RecipeWithAuthor> = recipes
            .map(|r| RecipeWithAuthor::new(r.clone(), self.author(r.user_id)))
            .collect();
        out.reverse();
        out.sort_by(|a, b| b.date_posted.cmp(&a.date_posted));
        out
    }
}

/// Both repositories over one lock, so email uniqueness holds under concurrent signups.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            country: user.country,
            password_hash: user.password_hash,
            recipes_contributed: 0,
            image_url: None,
            date_joined: OffsetDateTime::now_utc(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(country) = update.country {
            user.country = country;
        }
        if let Some(image_url) = update.image_url {
            user.image_url = Some(image_url);
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl RecipeRepo for MemoryStore {
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let mut inner = self.lock();
        let created = Recipe {
            id: Uuid::new_v4(),
            user_id: recipe.user_id,
            title: recipe.title,
            image_url: recipe.image_url,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            duration: recipe.duration,
            date_posted: OffsetDateTime::now_utc(),
        };
        if let Some(owner) = inner.users.iter_mut().find(|u| u.id == recipe.user_id) {
            owner.recipes_contributed += 1;
        }
        inner.recipes.push(created.clone());
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let inner = self.lock();
        Ok(inner.joined(inner.recipes.iter()))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.lock();
        Ok(inner.joined(
            inner
                .recipes
                .iter()
                .filter(|r| r.title.to_lowercase().contains(&needle)),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RecipeWithAuthor>, StoreError> {
        let inner = self.lock();
        Ok(inner.joined(inner.recipes.iter().filter(|r| r.id == id)).pop())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RecipeWithAuthor>, StoreError> {
        let inner = self.lock();
        Ok(inner.joined(inner.recipes.iter().filter(|r| r.user_id == user_id)))
    }

    async fn update(&self, id: Uuid, update: RecipeUpdate) -> Result<Option<Recipe>, StoreError> {
        let mut inner = self.lock();
        let Some(recipe) = inner.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            recipe.title = title;
        }
        if let Some(image_url) = update.image_url {
            recipe.image_url = image_url;
        }
        if let Some(ingredients) = update.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = update.instructions {
            recipe.instructions = instructions;
        }
        if let Some(duration) = update.duration {
            recipe.duration = duration;
        }
        Ok(Some(recipe.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.recipes.len();
        inner.recipes.retain(|r| r.id != id);
        Ok(inner.recipes.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: email.into(),
            country: "Nigeria".into(),
            password_hash: "hash".into(),
        }
    }

    fn new_recipe(user_id: Uuid, title: &str) -> NewRecipe {
        NewRecipe {
            user_id,
            title: title.into(),
            image_url: "https://img.local/x.jpg".into(),
            ingredients: vec!["salt".into()],
            instructions: "Mix.".into(),
            duration: 10,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_store() {
        let store = MemoryStore::default();
        UserRepo::create(&store, new_user("u@x.com")).await.unwrap();
        let err = UserRepo::create(&store, new_user("u@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn recipe_create_bumps_counter_and_joins_author() {
        let store = MemoryStore::default();
        let user = UserRepo::create(&store, new_user("u@x.com")).await.unwrap();
        RecipeRepo::create(&store, new_recipe(user.id, "Suya")).await.unwrap();

        let user = UserRepo::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(user.recipes_contributed, 1);

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user.as_ref().unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();
        RecipeRepo::create(&store, new_recipe(id, "Pepper Soup")).await.unwrap();
        RecipeRepo::create(&store, new_recipe(id, "Puff puff")).await.unwrap();

        assert_eq!(store.search("soup").await.unwrap().len(), 1);
        assert_eq!(store.search("PUFF").await.unwrap().len(), 1);
        assert_eq!(store.search("p").await.unwrap().len(), 2);
        assert!(store.search("lasagna").await.unwrap().is_empty());
        assert!(store.search("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_by_key() {
        let store = MemoryStore::default();
        let r = RecipeRepo::create(&store, new_recipe(Uuid::new_v4(), "Old"))
            .await
            .unwrap();

        let updated = store
            .update(
                r.id,
                RecipeUpdate {
                    title: Some("New".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.duration, 10);

        assert!(store.update(Uuid::new_v4(), RecipeUpdate::default()).await.unwrap().is_none());
        assert!(store.delete(r.id).await.unwrap());
        assert!(!store.delete(r.id).await.unwrap());
    }
}
