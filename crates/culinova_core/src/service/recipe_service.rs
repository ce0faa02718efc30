//! Recipe use-case service.
//!
//! # Responsibility
//! - Turn editor drafts into validated recipe aggregates.
//! - Provide list/detail/edit/delete entry points for collection views.
//! - Coordinate photo files with media rows.
//!
//! # Invariants
//! - A blank title never reaches storage.
//! - Draft rows the editor left empty are dropped, not persisted.
//! - Tag sets are normalized before replacement.

use crate::media::{ImageStore, MediaError};
use crate::model::media::{Media, MediaId, MediaKind};
use crate::model::recipe::{
    normalize_tag, normalize_tags, Ingredient, IngredientId, Recipe, RecipeId,
    RecipeValidationError, Step, UnitOfMeasure,
};
use crate::model::user::UserId;
use crate::repo::recipe_repo::{
    OwnerFilter, RecipeDetails, RecipeListQuery, RecipeRepository, RecipeSummary,
};
use crate::repo::{normalize_list_limit, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum RecipeServiceError {
    BlankTitle,
    InvalidTag(String),
    RecipeNotFound(RecipeId),
    /// The recipe belongs to another account.
    NotOwner(RecipeId),
    /// A child row (ingredient, media) does not exist.
    NotFound { entity: &'static str, id: uuid::Uuid },
    Validation(RecipeValidationError),
    Media(MediaError),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for RecipeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "recipe title must not be blank"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::NotOwner(id) => write!(f, "recipe {id} belongs to another account"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Media(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent recipe state: {details}"),
        }
    }
}

impl Error for RecipeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Media(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecipeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "recipe",
                id,
            } => Self::RecipeNotFound(id),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::RecipeValidation(RecipeValidationError::BlankTitle) => Self::BlankTitle,
            RepoError::RecipeValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RecipeValidationError> for RecipeServiceError {
    fn from(value: RecipeValidationError) -> Self {
        match value {
            RecipeValidationError::BlankTitle => Self::BlankTitle,
            other => Self::Validation(other),
        }
    }
}

impl From<MediaError> for RecipeServiceError {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

/// Ingredient row as typed into the editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientDraft {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<UnitOfMeasure>,
    pub note: Option<String>,
}

impl IngredientDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_ingredient(self) -> Ingredient {
        let mut ingredient = Ingredient::with_amount(self.name.trim(), self.quantity, self.unit);
        ingredient.note = self.note.filter(|note| !note.trim().is_empty());
        ingredient
    }
}

/// Step row as typed into the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepDraft {
    pub text: String,
    pub timer_seconds: Option<u32>,
}

impl StepDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timer_seconds: None,
        }
    }
}

/// Full editor form submitted on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub owner_id: Option<UserId>,
    pub title: String,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub servings: Option<u32>,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
    pub ingredients: Vec<IngredientDraft>,
    pub steps: Vec<StepDraft>,
    pub tags: Vec<String>,
}

impl RecipeDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builds the aggregate; empty rows are skipped and steps numbered `1..=n`.
    fn into_recipe(self) -> Result<Recipe, RecipeServiceError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(RecipeServiceError::BlankTitle);
        }

        let mut recipe = Recipe::new(title);
        recipe.owner_id = self.owner_id;
        recipe.summary = non_blank(self.summary);
        recipe.notes = non_blank(self.notes);
        recipe.servings = self.servings;
        recipe.prep_minutes = self.prep_minutes;
        recipe.cook_minutes = self.cook_minutes;
        recipe.ingredients = self
            .ingredients
            .into_iter()
            .filter(|draft| !draft.name.trim().is_empty())
            .map(IngredientDraft::into_ingredient)
            .collect();
        for draft in self
            .steps
            .into_iter()
            .filter(|draft| !draft.text.trim().is_empty())
        {
            let order = recipe.steps.len() as u32 + 1;
            let mut step = Step::new(order, draft.text.trim());
            step.timer_seconds = draft.timer_seconds;
            recipe.steps.push(step);
        }
        recipe.tags = normalize_tags(&self.tags);
        Ok(recipe)
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipesListResult {
    /// Sorted by `created_at DESC, uuid ASC`.
    pub items: Vec<RecipeSummary>,
    pub applied_limit: u32,
}

/// Recipe service facade over repository implementations.
pub struct RecipeService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one recipe with all of its children.
    pub fn create_recipe(&self, draft: RecipeDraft) -> Result<Recipe, RecipeServiceError> {
        let recipe = draft.into_recipe()?;
        let recipe_id = self.repo.create_recipe(&recipe)?;
        log::info!(
            "event=recipe_create module=service status=ok ingredients={} steps={} tags={}",
            recipe.ingredients.len(),
            recipe.steps.len(),
            recipe.tags.len()
        );
        self.read_back(recipe_id, "created recipe not found in read-back")
    }

    pub fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, RecipeServiceError> {
        Ok(self.repo.get_recipe(id)?)
    }

    /// Loads `id` when `actor` may change it.
    ///
    /// `actor = None` (signed out) can only edit unowned recipes.
    pub fn ensure_editable(
        &self,
        id: RecipeId,
        actor: Option<UserId>,
    ) -> Result<Recipe, RecipeServiceError> {
        let recipe = self
            .repo
            .get_recipe(id)?
            .ok_or(RecipeServiceError::RecipeNotFound(id))?;
        if !recipe.is_editable_by(actor) {
            log::warn!("event=recipe_access module=service status=denied recipe_id={id}");
            return Err(RecipeServiceError::NotOwner(id));
        }
        Ok(recipe)
    }

    /// Lists recipes using owner, single-tag and title filters.
    pub fn list_recipes(
        &self,
        query: RecipeListQuery,
    ) -> Result<RecipesListResult, RecipeServiceError> {
        let applied_limit = normalize_list_limit(query.limit);
        let query = RecipeListQuery {
            tag: query.tag.and_then(|value| normalize_tag(&value)),
            title_contains: query
                .title_contains
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            limit: Some(applied_limit),
            ..query
        };
        let items = self.repo.list_recipes(&query)?;
        Ok(RecipesListResult {
            items,
            applied_limit,
        })
    }

    /// Replaces the editable scalar fields.
    pub fn update_details(
        &self,
        id: RecipeId,
        details: RecipeDetails,
    ) -> Result<Recipe, RecipeServiceError> {
        let title = details.title.trim();
        if title.is_empty() {
            return Err(RecipeServiceError::BlankTitle);
        }
        let details = RecipeDetails {
            title: title.to_string(),
            summary: non_blank(details.summary),
            notes: non_blank(details.notes),
            ..details
        };
        self.repo.update_details(id, &details)?;
        self.read_back(id, "updated recipe not found in read-back")
    }

    /// Deletes a recipe and returns it so callers can drop media files.
    pub fn delete_recipe(&self, id: RecipeId) -> Result<Recipe, RecipeServiceError> {
        let recipe = self
            .repo
            .get_recipe(id)?
            .ok_or(RecipeServiceError::RecipeNotFound(id))?;
        self.repo.delete_recipe(id)?;
        log::info!("event=recipe_delete module=service status=ok recipe_id={id}");
        Ok(recipe)
    }

    pub fn add_ingredient(
        &self,
        recipe_id: RecipeId,
        draft: IngredientDraft,
    ) -> Result<Ingredient, RecipeServiceError> {
        if draft.name.trim().is_empty() {
            return Err(RecipeValidationError::BlankIngredientName { index: 0 }.into());
        }
        let ingredient = draft.into_ingredient();
        self.repo.add_ingredient(recipe_id, &ingredient)?;
        Ok(ingredient)
    }

    pub fn remove_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<(), RecipeServiceError> {
        Ok(self.repo.remove_ingredient(recipe_id, ingredient_id)?)
    }

    /// Atomically replaces the full tag set for one recipe.
    pub fn set_tags(
        &self,
        recipe_id: RecipeId,
        tags: Vec<String>,
    ) -> Result<Recipe, RecipeServiceError> {
        if let Some(blank) = tags.iter().find(|tag| tag.trim().is_empty()) {
            return Err(RecipeServiceError::InvalidTag(blank.clone()));
        }
        self.repo.set_tags(recipe_id, &normalize_tags(&tags))?;
        self.read_back(recipe_id, "recipe missing after tag replacement")
    }

    pub fn list_tags(&self, owner: OwnerFilter) -> Result<Vec<String>, RecipeServiceError> {
        Ok(self.repo.list_tags(owner)?)
    }

    /// Stores a photo file with its thumbnail and appends a media row.
    ///
    /// The file is removed again when the row cannot be written.
    pub fn add_photo(
        &self,
        store: &ImageStore,
        recipe_id: RecipeId,
        bytes: &[u8],
    ) -> Result<Media, RecipeServiceError> {
        if self.repo.get_recipe(recipe_id)?.is_none() {
            return Err(RecipeServiceError::RecipeNotFound(recipe_id));
        }

        let stored = store.save(bytes)?;
        let mut media = Media::local_photo(
            stored.path.to_string_lossy().into_owned(),
            Some(stored.thumbnail),
        );
        media.id = stored.id;

        if let Err(err) = self.repo.add_media(recipe_id, &media) {
            if let Err(cleanup) = store.remove(&stored.path) {
                log::warn!(
                    "event=photo_cleanup module=service status=error error={}",
                    cleanup
                );
            }
            return Err(err.into());
        }
        Ok(media)
    }

    /// Appends remote media by URL.
    pub fn add_media(
        &self,
        recipe_id: RecipeId,
        kind: MediaKind,
        remote_url: &str,
    ) -> Result<Media, RecipeServiceError> {
        let remote_url = remote_url.trim();
        if remote_url.is_empty() {
            return Err(RecipeValidationError::MediaWithoutLocation { index: 0 }.into());
        }
        let mut media = Media::new(kind);
        media.remote_url = Some(remote_url.to_string());
        self.repo.add_media(recipe_id, &media)?;
        Ok(media)
    }

    /// Removes a media row and its local file when one exists.
    pub fn remove_media(
        &self,
        store: &ImageStore,
        recipe_id: RecipeId,
        media_id: MediaId,
    ) -> Result<Media, RecipeServiceError> {
        let removed = self.repo.remove_media(recipe_id, media_id)?;
        if let Some(path) = removed.local_path.as_deref() {
            if let Err(err) = store.remove(Path::new(path)) {
                log::warn!("event=media_file_remove module=service status=error error={err}");
            }
        }
        Ok(removed)
    }

    fn read_back(
        &self,
        id: RecipeId,
        details: &'static str,
    ) -> Result<Recipe, RecipeServiceError> {
        self.repo
            .get_recipe(id)?
            .ok_or(RecipeServiceError::InconsistentState(details))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
