//! Step editor use-cases.
//!
//! Every structural change returns the renumbered list so the editor can
//! redraw without a second read.

use crate::model::recipe::{RecipeId, Step, StepId};
use crate::repo::step_repo::StepRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum StepServiceError {
    BlankText,
    RecipeNotFound(RecipeId),
    StepNotFound(StepId),
    Repo(RepoError),
}

impl Display for StepServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "step text must not be blank"),
            Self::RecipeNotFound(id) => write!(f, "recipe not found: {id}"),
            Self::StepNotFound(id) => write!(f, "step not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StepServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StepServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "recipe",
                id,
            } => Self::RecipeNotFound(id),
            RepoError::NotFound { entity: "step", id } => Self::StepNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct StepService<R: StepRepository> {
    repo: R,
}

impl<R: StepRepository> StepService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_steps(&self, recipe_id: RecipeId) -> Result<Vec<Step>, StepServiceError> {
        Ok(self.repo.list_steps(recipe_id)?)
    }

    /// Appends a step after the current last one.
    pub fn add_step(
        &self,
        recipe_id: RecipeId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> Result<Step, StepServiceError> {
        let text = require_text(text)?;
        Ok(self.repo.append_step(recipe_id, text, timer_seconds)?)
    }

    /// Inserts a step at 1-based `position`; later steps shift down.
    pub fn insert_step(
        &self,
        recipe_id: RecipeId,
        position: u32,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> Result<Vec<Step>, StepServiceError> {
        let text = require_text(text)?;
        self.repo
            .insert_step(recipe_id, position, text, timer_seconds)?;
        Ok(self.repo.list_steps(recipe_id)?)
    }

    pub fn edit_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> Result<(), StepServiceError> {
        let text = require_text(text)?;
        Ok(self
            .repo
            .update_step(recipe_id, step_id, text, timer_seconds)?)
    }

    pub fn delete_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
    ) -> Result<Vec<Step>, StepServiceError> {
        Ok(self.repo.delete_step(recipe_id, step_id)?)
    }

    pub fn move_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        target_position: u32,
    ) -> Result<Vec<Step>, StepServiceError> {
        Ok(self.repo.move_step(recipe_id, step_id, target_position)?)
    }
}

fn require_text(text: &str) -> Result<&str, StepServiceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StepServiceError::BlankText);
    }
    Ok(trimmed)
}
