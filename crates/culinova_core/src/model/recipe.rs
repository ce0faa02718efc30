//! Recipe aggregate: ingredients, ordered steps, tags and media.
//!
//! # Responsibility
//! - Define the recipe record and its owned child rows.
//! - Provide validation and the pure ordering/normalization helpers shared
//!   by repositories and services.
//!
//! # Invariants
//! - `title` is never blank for a persisted recipe.
//! - Step `order` values form the dense sequence `1..=n`.
//! - Tag labels are trimmed, lowercased, deduplicated and sorted.

use crate::db::now_epoch_ms;
use crate::model::media::Media;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RecipeId = Uuid;
pub type IngredientId = Uuid;
pub type StepId = Uuid;

/// Supported ingredient units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    G,
    Kg,
    Ml,
    L,
    Tsp,
    Tbsp,
    Cup,
    Piece,
}

impl UnitOfMeasure {
    pub const ALL: [UnitOfMeasure; 8] = [
        Self::G,
        Self::Kg,
        Self::Ml,
        Self::L,
        Self::Tsp,
        Self::Tbsp,
        Self::Cup,
        Self::Piece,
    ];

    /// Storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Kg => "kg",
            Self::Ml => "ml",
            Self::L => "l",
            Self::Tsp => "tsp",
            Self::Tbsp => "tbsp",
            Self::Cup => "cup",
            Self::Piece => "piece",
        }
    }

    /// Short label for display next to a quantity.
    pub fn display(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::Piece => "pc",
            other => other.as_str(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<UnitOfMeasure>,
    pub note: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            quantity: None,
            unit: None,
            note: None,
        }
    }

    pub fn with_amount(
        name: impl Into<String>,
        quantity: Option<f64>,
        unit: Option<UnitOfMeasure>,
    ) -> Self {
        let mut ingredient = Self::new(name);
        ingredient.quantity = quantity;
        ingredient.unit = unit;
        ingredient
    }

    /// Validates this row as the `index`-th ingredient of a recipe.
    pub fn validate_at(&self, index: usize) -> Result<(), RecipeValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecipeValidationError::BlankIngredientName { index });
        }
        if let Some(quantity) = self.quantity {
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(RecipeValidationError::InvalidQuantity { index, quantity });
            }
        }
        Ok(())
    }
}

/// One instruction. `order` is 1-based and dense within a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub order: u32,
    pub text: String,
    pub timer_seconds: Option<u32>,
}

impl Step {
    pub fn new(order: u32, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            text: text.into(),
            timer_seconds: None,
        }
    }
}

/// Canonical recipe record with its child collections loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    /// `None` until a signed-in session adopts the recipe.
    pub owner_id: Option<UserId>,
    pub title: String,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub servings: Option<u32>,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
    pub created_at: i64,
    pub updated_at: i64,
    pub ingredients: Vec<Ingredient>,
    /// Sorted by `order`.
    pub steps: Vec<Step>,
    /// Normalized labels, sorted.
    pub tags: Vec<String>,
    pub media: Vec<Media>,
}

impl Recipe {
    /// Creates an empty recipe with a generated id and current timestamps.
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner_id: None,
            title: title.into(),
            summary: None,
            notes: None,
            servings: None,
            prep_minutes: None,
            cook_minutes: None,
            created_at: now,
            updated_at: now,
            ingredients: Vec::new(),
            steps: Vec::new(),
            tags: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Appends a step at `max(order) + 1`.
    pub fn push_step(&mut self, text: impl Into<String>) -> &Step {
        let next = self.steps.iter().map(|step| step.order).max().unwrap_or(0) + 1;
        self.steps.push(Step::new(next, text));
        &self.steps[self.steps.len() - 1]
    }

    /// Total of prep and cook time when at least one is known.
    pub fn total_minutes(&self) -> Option<u32> {
        match (self.prep_minutes, self.cook_minutes) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0).saturating_add(cook.unwrap_or(0))),
        }
    }

    /// Unowned recipes are editable by anyone; owned ones only by their owner.
    pub fn is_editable_by(&self, user: Option<UserId>) -> bool {
        match self.owner_id {
            None => true,
            Some(owner) => user == Some(owner),
        }
    }

    /// First photo thumbnail, used for list rows.
    pub fn cover_thumbnail(&self) -> Option<&[u8]> {
        self.media
            .iter()
            .filter(|media| media.kind == crate::model::media::MediaKind::Photo)
            .find_map(|media| media.thumbnail.as_deref())
    }

    /// Checks the invariants required before persistence.
    pub fn validate(&self) -> Result<(), RecipeValidationError> {
        validate_title(&self.title)?;
        for (index, ingredient) in self.ingredients.iter().enumerate() {
            ingredient.validate_at(index)?;
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.text.trim().is_empty() {
                return Err(RecipeValidationError::BlankStepText { index });
            }
        }
        ensure_dense_order(self.steps.iter().map(|step| step.order))?;
        for label in &self.tags {
            ensure_normalized_tag(label)?;
        }
        for (index, media) in self.media.iter().enumerate() {
            if !media.has_location() {
                return Err(RecipeValidationError::MediaWithoutLocation { index });
            }
        }
        Ok(())
    }
}

/// Validation failures for recipe writes.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeValidationError {
    BlankTitle,
    BlankIngredientName { index: usize },
    InvalidQuantity { index: usize, quantity: f64 },
    BlankStepText { index: usize },
    /// Step orders are not exactly `1..=n`.
    NonDenseStepOrder { expected: u32, found: u32 },
    UnnormalizedTag(String),
    MediaWithoutLocation { index: usize },
}

impl Display for RecipeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "recipe title must not be blank"),
            Self::BlankIngredientName { index } => {
                write!(f, "ingredient #{index} has a blank name")
            }
            Self::InvalidQuantity { index, quantity } => {
                write!(f, "ingredient #{index} has invalid quantity {quantity}")
            }
            Self::BlankStepText { index } => write!(f, "step #{index} has blank text"),
            Self::NonDenseStepOrder { expected, found } => write!(
                f,
                "step order must be a dense 1-based sequence: expected {expected}, found {found}"
            ),
            Self::UnnormalizedTag(label) => write!(f, "tag `{label}` is not normalized"),
            Self::MediaWithoutLocation { index } => {
                write!(f, "media #{index} has neither a local path nor a remote url")
            }
        }
    }
}

impl Error for RecipeValidationError {}

/// Rejects whitespace-only titles.
pub fn validate_title(title: &str) -> Result<(), RecipeValidationError> {
    if title.trim().is_empty() {
        return Err(RecipeValidationError::BlankTitle);
    }
    Ok(())
}

/// Verifies that `orders`, once sorted, equal `1..=n`.
pub fn ensure_dense_order(
    orders: impl IntoIterator<Item = u32>,
) -> Result<(), RecipeValidationError> {
    let mut sorted = orders.into_iter().collect::<Vec<_>>();
    sorted.sort_unstable();
    for (index, found) in sorted.into_iter().enumerate() {
        let expected = index as u32 + 1;
        if found != expected {
            return Err(RecipeValidationError::NonDenseStepOrder { expected, found });
        }
    }
    Ok(())
}

/// Sorts steps by current order (ties keep input order) and rewrites
/// `order` to `1..=n`.
pub fn renumber_steps(steps: &mut [Step]) {
    steps.sort_by_key(|step| step.order);
    for (index, step) in steps.iter_mut().enumerate() {
        step.order = index as u32 + 1;
    }
}

/// Rejects labels that `normalize_tag` would change.
pub fn ensure_normalized_tag(label: &str) -> Result<(), RecipeValidationError> {
    if normalize_tag(label).as_deref() != Some(label) {
        return Err(RecipeValidationError::UnnormalizedTag(label.to_string()));
    }
    Ok(())
}

/// Normalizes one tag label. Returns `None` for blank input.
pub fn normalize_tag(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, deduplicates and sorts tag labels; blanks are dropped.
pub fn normalize_tags<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| normalize_tag(label.as_ref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
