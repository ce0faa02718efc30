//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose recipe, step, session and search use-cases to Dart via FRB.
//! - Hold the process-wide signed-in session between calls.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every failure is reported as `ok = false` plus a displayable message.
//! - Each call opens its own connection; only the session outlives a call.
//! - Writes to an owned recipe require its owner to be signed in.

use culinova_core::auth::DEFAULT_NONCE_LEN;
use culinova_core::db::open_db;
use culinova_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    random_nonce, search_recipes, sha256_hex, AuthIdentity, AuthProvider, ImageStore,
    IngredientDraft, OwnerFilter, Recipe, RecipeDetails, RecipeDraft, RecipeListQuery,
    RecipeSearchQuery, RecipeService, RecipeSummary, SessionError, SessionService,
    SqliteRecipeRepository, SqliteStepRepository, SqliteUserRepository, Step, StepDraft,
    StepService, User,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

const DB_FILE_NAME: &str = "culinova.sqlite3";
const MEDIA_DIR_NAME: &str = "culinova_media";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static MEDIA_DIR: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Mutex<SessionService>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created/affected record.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub ok: bool,
    /// `None` when signed out.
    pub user: Option<UserItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeItem {
    pub recipe_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub ingredient_count: u32,
    pub step_count: u32,
    pub created_at: i64,
    pub updated_at: i64,
    /// PNG bytes of the first photo thumbnail.
    pub cover_thumbnail: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeListResponse {
    pub ok: bool,
    pub items: Vec<RecipeItem>,
    pub applied_limit: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepItem {
    pub step_id: String,
    pub order: u32,
    pub text: String,
    pub timer_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepsResponse {
    pub ok: bool,
    /// Full renumbered step list after the write.
    pub items: Vec<StepItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub recipe_id: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub ok: bool,
    pub items: Vec<SearchItem>,
    pub applied_limit: u32,
    pub message: String,
}

/// Raw nonce kept by the host plus the digest sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceResponse {
    pub nonce: String,
    pub hashed: String,
}

/// Applies an auth state notification from the host identity provider.
///
/// `external_id = None` means the provider reports no signed-in user.
#[flutter_rust_bridge::frb(sync)]
pub fn session_auth_changed(
    external_id: Option<String>,
    display_name: Option<String>,
    provider: String,
) -> SessionResponse {
    let result = (|| -> Result<Option<User>, String> {
        let identity = match external_id {
            Some(external_id) => {
                let provider = AuthProvider::parse(&provider)
                    .ok_or_else(|| format!("unknown auth provider `{}`", provider.trim()))?;
                let mut identity = AuthIdentity::new(external_id, provider);
                identity.display_name = display_name;
                Some(identity)
            }
            None => None,
        };

        with_conn(|conn| {
            let users = SqliteUserRepository::try_new(conn).map_err(|err| err.to_string())?;
            let mut session = lock_session()?;
            session
                .handle_auth_state(&users, identity.as_ref())
                .map_err(|err| err.to_string())
        })
    })();

    match result {
        Ok(Some(user)) => session_response(Some(&user), "Signed in."),
        Ok(None) => session_response(None, "Signed out."),
        Err(err) => session_failure(format!("session_auth_changed failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_sign_out() -> SessionResponse {
    match lock_session() {
        Ok(mut session) => {
            session.sign_out();
            session_response(None, "Signed out.")
        }
        Err(err) => session_failure(format!("session_sign_out failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_current_user() -> SessionResponse {
    match lock_session() {
        Ok(session) => match session.current_user() {
            Some(user) => session_response(Some(user), "Signed in."),
            None => session_response(None, "Signed out."),
        },
        Err(err) => session_failure(format!("session_current_user failed: {err}")),
    }
}

/// Creates a recipe owned by the signed-in user (unowned when signed out).
///
/// Blank ingredient and step rows are skipped; a blank title is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_create(
    title: String,
    notes: Option<String>,
    ingredients: Vec<String>,
    steps: Vec<String>,
    tags: Vec<String>,
) -> ActionResponse {
    let owner_id = match current_user_id() {
        Ok(owner_id) => owner_id,
        Err(err) => return ActionResponse::failure(format!("recipe_create failed: {err}")),
    };
    let draft = RecipeDraft {
        owner_id,
        title,
        notes,
        ingredients: ingredients.into_iter().map(IngredientDraft::named).collect(),
        steps: steps.into_iter().map(StepDraft::text).collect(),
        tags,
        ..RecipeDraft::default()
    };

    match with_recipe_service(|service| {
        service
            .create_recipe(draft)
            .map_err(|err| err.to_string())
    }) {
        Ok(recipe) => ActionResponse::success("Recipe created.", Some(recipe.id.to_string())),
        Err(err) => ActionResponse::failure(format!("recipe_create failed: {err}")),
    }
}

/// Replaces title and notes of one recipe.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_update(recipe_id: String, title: String, notes: Option<String>) -> ActionResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|id| {
        with_editable_recipe(id, |current, conn| {
            let service = recipe_service(conn)?;
            let details = RecipeDetails {
                title,
                notes,
                ..RecipeDetails::from(current)
            };
            service
                .update_details(id, details)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(recipe) => ActionResponse::success("Recipe updated.", Some(recipe.id.to_string())),
        Err(err) => ActionResponse::failure(format!("recipe_update failed: {err}")),
    }
}

/// Lists the signed-in user's recipes after re-attaching stray ones.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_list(
    tag: Option<String>,
    title_contains: Option<String>,
    limit: Option<u32>,
    offset: u32,
) -> RecipeListResponse {
    let applied_limit = culinova_core::repo::normalize_list_limit(limit);
    let query = RecipeListQuery {
        owner: OwnerFilter::Any,
        tag: tag.and_then(|value| culinova_core::model::recipe::normalize_tag(&value)),
        title_contains,
        limit: Some(applied_limit),
        offset,
    };

    let result = with_conn(|conn| {
        let recipes = SqliteRecipeRepository::try_new(conn).map_err(|err| err.to_string())?;
        let session = lock_session()?;
        session
            .reload_collection(&recipes, query)
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(items) => {
            let message = if items.is_empty() {
                "No recipes.".to_string()
            } else {
                format!("Found {} recipe(s).", items.len())
            };
            RecipeListResponse {
                ok: true,
                items: items.into_iter().map(to_recipe_item).collect(),
                applied_limit,
                message,
            }
        }
        Err(err) => RecipeListResponse {
            ok: false,
            items: Vec::new(),
            applied_limit,
            message: format!("recipe_list failed: {err}"),
        },
    }
}

/// Deletes a recipe and its local photo files.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_delete(recipe_id: String) -> ActionResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|id| {
        with_editable_recipe(id, |_, conn| {
            recipe_service(conn)?
                .delete_recipe(id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(recipe) => {
            let store = image_store();
            for path in recipe.media.iter().filter_map(|m| m.local_path.as_deref()) {
                if let Err(err) = store.remove(Path::new(path)) {
                    log::warn!("event=media_file_remove module=ffi status=error error={err}");
                }
            }
            ActionResponse::success("Recipe deleted.", Some(recipe.id.to_string()))
        }
        Err(err) => ActionResponse::failure(format!("recipe_delete failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn recipe_set_tags(recipe_id: String, tags: Vec<String>) -> ActionResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|id| {
        with_editable_recipe(id, |_, conn| {
            recipe_service(conn)?
                .set_tags(id, tags)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(recipe) => ActionResponse::success(
            format!("{} tag(s) saved.", recipe.tags.len()),
            Some(recipe.id.to_string()),
        ),
        Err(err) => ActionResponse::failure(format!("recipe_set_tags failed: {err}")),
    }
}

/// Stores picked image bytes and attaches them as a photo.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_add_photo(recipe_id: String, image_bytes: Vec<u8>) -> ActionResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|id| {
        with_editable_recipe(id, |_, conn| {
            recipe_service(conn)?
                .add_photo(&image_store(), id, &image_bytes)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(media) => ActionResponse::success("Photo added.", Some(media.id.to_string())),
        Err(err) => ActionResponse::failure(format!("recipe_add_photo failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn step_add(recipe_id: String, text: String, timer_seconds: Option<u32>) -> StepsResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|id| {
        with_editable_recipe(id, |_, conn| {
            let service = step_service(conn)?;
            service
                .add_step(id, &text, timer_seconds)
                .and_then(|_| service.list_steps(id))
                .map_err(|err| err.to_string())
        })
    });
    steps_response(result, "step_add")
}

#[flutter_rust_bridge::frb(sync)]
pub fn step_delete(recipe_id: String, step_id: String) -> StepsResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|recipe_id| {
        let step_id = parse_id(&step_id, "step_id")?;
        with_editable_recipe(recipe_id, |_, conn| {
            step_service(conn)?
                .delete_step(recipe_id, step_id)
                .map_err(|err| err.to_string())
        })
    });
    steps_response(result, "step_delete")
}

/// Moves one step to 1-based `target_position`.
#[flutter_rust_bridge::frb(sync)]
pub fn step_move(recipe_id: String, step_id: String, target_position: u32) -> StepsResponse {
    let result = parse_id(&recipe_id, "recipe_id").and_then(|recipe_id| {
        let step_id = parse_id(&step_id, "step_id")?;
        with_editable_recipe(recipe_id, |_, conn| {
            step_service(conn)?
                .move_step(recipe_id, step_id, target_position)
                .map_err(|err| err.to_string())
        })
    });
    steps_response(result, "step_move")
}

/// Full-text search over the signed-in user's recipes.
#[flutter_rust_bridge::frb(sync)]
pub fn recipe_search(text: String, limit: Option<u32>) -> SearchResponse {
    let applied_limit = culinova_core::repo::normalize_list_limit(limit);
    let result = require_user_id().and_then(|owner| {
        let query = RecipeSearchQuery {
            text: text.trim().to_string(),
            owner: Some(owner),
            limit: Some(applied_limit),
            raw_fts_syntax: false,
        };
        with_conn(|conn| search_recipes(conn, &query).map_err(|err| err.to_string()))
    });

    match result {
        Ok(hits) => {
            let items = hits
                .into_iter()
                .map(|hit| SearchItem {
                    recipe_id: hit.recipe_id.to_string(),
                    title: hit.title,
                    snippet: hit.snippet,
                })
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} result(s).", items.len())
            };
            SearchResponse {
                ok: true,
                items,
                applied_limit,
                message,
            }
        }
        Err(err) => SearchResponse {
            ok: false,
            items: Vec::new(),
            applied_limit,
            message: format!("recipe_search failed: {err}"),
        },
    }
}

/// Fresh sign-in nonce and its SHA-256 digest.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_new_nonce() -> NonceResponse {
    let nonce = random_nonce(DEFAULT_NONCE_LEN);
    let hashed = sha256_hex(&nonce);
    NonceResponse { nonce, hashed }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| env_path("CULINOVA_DB_PATH", DB_FILE_NAME))
        .clone()
}

fn image_store() -> ImageStore {
    ImageStore::new(
        MEDIA_DIR
            .get_or_init(|| env_path("CULINOVA_MEDIA_DIR", MEDIA_DIR_NAME))
            .clone(),
    )
}

fn env_path(var: &str, fallback_name: &str) -> PathBuf {
    if let Ok(raw) = std::env::var(var) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(fallback_name)
}

fn lock_session() -> Result<MutexGuard<'static, SessionService>, String> {
    SESSION
        .get_or_init(|| Mutex::new(SessionService::new()))
        .lock()
        .map_err(|_| "session state is unavailable".to_string())
}

fn current_user_id() -> Result<Option<Uuid>, String> {
    Ok(lock_session()?.current_user().map(|user| user.id))
}

fn require_user_id() -> Result<Uuid, String> {
    current_user_id()?.ok_or_else(|| SessionError::NotSignedIn.to_string())
}

fn with_conn<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))?;
    f(&conn)
}

fn recipe_service(
    conn: &Connection,
) -> Result<RecipeService<SqliteRecipeRepository<'_>>, String> {
    let repo = SqliteRecipeRepository::try_new(conn)
        .map_err(|err| format!("recipe repo init failed: {err}"))?;
    Ok(RecipeService::new(repo))
}

fn step_service(conn: &Connection) -> Result<StepService<SqliteStepRepository<'_>>, String> {
    let repo = SqliteStepRepository::try_new(conn)
        .map_err(|err| format!("step repo init failed: {err}"))?;
    Ok(StepService::new(repo))
}

fn with_recipe_service<T>(
    f: impl FnOnce(&RecipeService<SqliteRecipeRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_conn(|conn| f(&recipe_service(conn)?))
}

/// Runs `f` on the recipe only when the signed-in user may change it.
fn with_editable_recipe<T>(
    recipe_id: Uuid,
    f: impl FnOnce(&Recipe, &Connection) -> Result<T, String>,
) -> Result<T, String> {
    let actor = current_user_id()?;
    with_conn(|conn| {
        let recipe = recipe_service(conn)?
            .ensure_editable(recipe_id, actor)
            .map_err(|err| err.to_string())?;
        f(&recipe, conn)
    })
}

fn parse_id(value: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid {field}: `{}`", value.trim()))
}

fn session_response(user: Option<&User>, message: &str) -> SessionResponse {
    SessionResponse {
        ok: true,
        user: user.map(|user| UserItem {
            user_id: user.id.to_string(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }),
        message: message.to_string(),
    }
}

fn session_failure(message: String) -> SessionResponse {
    SessionResponse {
        ok: false,
        user: None,
        message,
    }
}

fn steps_response(result: Result<Vec<Step>, String>, operation: &str) -> StepsResponse {
    match result {
        Ok(steps) => StepsResponse {
            ok: true,
            message: format!("{} step(s).", steps.len()),
            items: steps
                .into_iter()
                .map(|step| StepItem {
                    step_id: step.id.to_string(),
                    order: step.order,
                    text: step.text,
                    timer_seconds: step.timer_seconds,
                })
                .collect(),
        },
        Err(err) => StepsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn to_recipe_item(summary: RecipeSummary) -> RecipeItem {
    RecipeItem {
        recipe_id: summary.id.to_string(),
        title: summary.title,
        summary: summary.summary,
        tags: summary.tags,
        ingredient_count: summary.ingredient_count,
        step_count: summary.step_count,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
        cover_thumbnail: summary.cover_thumbnail,
    }
}
