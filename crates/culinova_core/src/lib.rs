//! Core domain logic for Culinova.
//! This crate owns the recipe graph, its storage and the session rules that
//! tie recipes to the signed-in account.

pub mod auth;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use auth::{random_nonce, sha256_hex, AuthIdentity};
pub use logging::{default_log_level, init_logging, logging_status};
pub use media::{ImageStore, MediaError};
pub use model::media::{Media, MediaId, MediaKind};
pub use model::recipe::{Ingredient, Recipe, RecipeId, RecipeValidationError, Step, StepId};
pub use model::user::{AuthProvider, User, UserId};
pub use repo::recipe_repo::{
    OwnerFilter, RecipeDetails, RecipeListQuery, RecipeRepository, RecipeSummary,
    SqliteRecipeRepository,
};
pub use repo::step_repo::{SqliteStepRepository, StepRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use search::fts::{
    search_recipes, RecipeSearchHit, RecipeSearchQuery, SearchError, SearchResult,
};
pub use service::recipe_service::{
    IngredientDraft, RecipeDraft, RecipeService, RecipeServiceError, StepDraft,
};
pub use service::session_service::{SessionChange, SessionError, SessionService};
pub use service::social_service::{SocialError, SocialService};
pub use service::step_service::{StepService, StepServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
