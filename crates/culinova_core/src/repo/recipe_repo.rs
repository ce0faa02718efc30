//! Recipe repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the recipe aggregate (ingredients, steps, tags, media) atomically.
//! - Provide owner/tag/title filtered listing for collection views.
//! - Own the ownership writes used by session reconciliation.
//!
//! # Invariants
//! - `create_recipe` validates the whole aggregate before any SQL runs.
//! - Tag replacement swaps the full set in a single transaction.
//! - Child-row writes bump the parent's `updated_at`.
//! - Listing is deterministic: `created_at DESC, uuid ASC`.
//! - `get_recipe` always returns a dense `1..=n` step order.

use crate::db::{ensure_tables, now_epoch_ms};
use crate::model::media::{Media, MediaId, MediaKind};
use crate::model::recipe::{
    ensure_dense_order, ensure_normalized_tag, renumber_steps, validate_title, Ingredient,
    IngredientId, Recipe, RecipeId, RecipeValidationError, UnitOfMeasure,
};
use crate::model::user::UserId;
use crate::repo::step_repo::{ensure_recipe_exists, insert_step_row, load_steps, touch_recipe};
use crate::repo::{map_write_error, normalize_list_limit, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const RECIPE_SELECT_SQL: &str = "SELECT
    uuid,
    owner_uuid,
    title,
    summary,
    notes,
    servings,
    prep_minutes,
    cook_minutes,
    created_at,
    updated_at
FROM recipes";

/// Ownership filter for recipe listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerFilter {
    #[default]
    Any,
    Owner(UserId),
    /// Recipes not yet attached to any account.
    Unowned,
}

/// Query options for recipe list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeListQuery {
    pub owner: OwnerFilter,
    /// Single-tag exact match (case-insensitive).
    pub tag: Option<String>,
    /// Case-insensitive substring match on title.
    pub title_contains: Option<String>,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Row model for collection views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub owner_id: Option<UserId>,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<String>,
    pub ingredient_count: u32,
    pub step_count: u32,
    /// Thumbnail of the first photo that has one.
    pub cover_thumbnail: Option<Vec<u8>>,
}

/// Scalar fields editable from the detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDetails {
    pub title: String,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub servings: Option<u32>,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
}

impl From<&Recipe> for RecipeDetails {
    fn from(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            summary: recipe.summary.clone(),
            notes: recipe.notes.clone(),
            servings: recipe.servings,
            prep_minutes: recipe.prep_minutes,
            cook_minutes: recipe.cook_minutes,
        }
    }
}

/// Repository interface for the recipe aggregate.
pub trait RecipeRepository {
    fn create_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId>;
    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>>;
    fn list_recipes(&self, query: &RecipeListQuery) -> RepoResult<Vec<RecipeSummary>>;
    fn update_details(&self, id: RecipeId, details: &RecipeDetails) -> RepoResult<()>;
    /// Hard delete; child rows cascade.
    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()>;
    fn add_ingredient(&self, recipe_id: RecipeId, ingredient: &Ingredient) -> RepoResult<()>;
    fn remove_ingredient(&self, recipe_id: RecipeId, ingredient_id: IngredientId)
        -> RepoResult<()>;
    /// Replaces all tags; labels must already be normalized.
    fn set_tags(&self, recipe_id: RecipeId, tags: &[String]) -> RepoResult<()>;
    /// Labels used by recipes matching `owner`, sorted.
    fn list_tags(&self, owner: OwnerFilter) -> RepoResult<Vec<String>>;
    fn add_media(&self, recipe_id: RecipeId, media: &Media) -> RepoResult<()>;
    /// Removes one media row and returns it so callers can drop the file.
    fn remove_media(&self, recipe_id: RecipeId, media_id: MediaId) -> RepoResult<Media>;
    fn assign_owner(&self, recipe_id: RecipeId, owner: Option<UserId>) -> RepoResult<()>;
    /// Attaches every ownerless recipe to `owner`. Returns affected rows.
    fn adopt_unowned(&self, owner: UserId) -> RepoResult<usize>;
    /// Moves recipes owned by legacy (no external id) users to `owner`.
    fn reassign_legacy_owned(&self, owner: UserId) -> RepoResult<usize>;
}

/// SQLite-backed recipe repository.
pub struct SqliteRecipeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecipeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                "users",
                "recipes",
                "ingredients",
                "steps",
                "tags",
                "recipe_tags",
                "media",
            ],
        )?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl RecipeRepository for SqliteRecipeRepository<'_> {
    fn create_recipe(&self, recipe: &Recipe) -> RepoResult<RecipeId> {
        recipe.validate()?;

        let tx = self.begin()?;
        if let Some(owner) = recipe.owner_id {
            ensure_user_exists(&tx, owner)?;
        }

        tx.execute(
            "INSERT INTO recipes (
                uuid,
                owner_uuid,
                title,
                summary,
                notes,
                servings,
                prep_minutes,
                cook_minutes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                recipe.id.to_string(),
                recipe.owner_id.map(|id| id.to_string()),
                recipe.title.as_str(),
                recipe.summary.as_deref(),
                recipe.notes.as_deref(),
                recipe.servings,
                recipe.prep_minutes,
                recipe.cook_minutes,
                recipe.created_at,
                recipe.updated_at,
            ],
        )
        .map_err(|err| map_write_error(err, "create recipe"))?;

        for (position, ingredient) in recipe.ingredients.iter().enumerate() {
            insert_ingredient_row(&tx, recipe.id, position as i64, ingredient)?;
        }
        for step in &recipe.steps {
            insert_step_row(&tx, recipe.id, step)?;
        }
        replace_tags(&tx, recipe.id, &recipe.tags)?;
        for (position, media) in recipe.media.iter().enumerate() {
            insert_media_row(&tx, recipe.id, position as i64, media)?;
        }

        tx.commit()?;
        Ok(recipe.id)
    }

    fn get_recipe(&self, id: RecipeId) -> RepoResult<Option<Recipe>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECIPE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut recipe = parse_recipe_row(row)?;
        recipe.ingredients = load_ingredients(self.conn, id)?;
        recipe.steps = load_steps(self.conn, id)?;
        recipe.tags = load_tags(self.conn, id)?;
        recipe.media = load_media(self.conn, id)?;
        // Rows written before renumbering existed may have gaps; read them
        // as their dense equivalent instead of refusing the recipe.
        if ensure_dense_order(recipe.steps.iter().map(|step| step.order)).is_err() {
            log::warn!(
                "event=step_order_repair module=repo status=ok steps={}",
                recipe.steps.len()
            );
            renumber_steps(&mut recipe.steps);
        }
        Ok(Some(recipe))
    }

    fn list_recipes(&self, query: &RecipeListQuery) -> RepoResult<Vec<RecipeSummary>> {
        let mut sql = String::from(
            "SELECT
                r.uuid AS uuid,
                r.owner_uuid AS owner_uuid,
                r.title AS title,
                r.summary AS summary,
                r.created_at AS created_at,
                r.updated_at AS updated_at,
                (SELECT COUNT(*) FROM ingredients i WHERE i.recipe_uuid = r.uuid)
                    AS ingredient_count,
                (SELECT COUNT(*) FROM steps s WHERE s.recipe_uuid = r.uuid) AS step_count,
                (SELECT m.thumbnail
                   FROM media m
                  WHERE m.recipe_uuid = r.uuid
                    AND m.kind = 'photo'
                    AND m.thumbnail IS NOT NULL
                  ORDER BY m.position ASC
                  LIMIT 1) AS cover_thumbnail
             FROM recipes r
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();

        match query.owner {
            OwnerFilter::Any => {}
            OwnerFilter::Owner(owner) => {
                sql.push_str(" AND r.owner_uuid = ?");
                bind_values.push(Value::Text(owner.to_string()));
            }
            OwnerFilter::Unowned => sql.push_str(" AND r.owner_uuid IS NULL"),
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM recipe_tags rt
                    INNER JOIN tags t ON t.id = rt.tag_id
                    WHERE rt.recipe_uuid = r.uuid
                      AND t.label = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        if let Some(needle) = query
            .title_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            sql.push_str(" AND instr(fold_case(r.title), ?) > 0");
            bind_values.push(Value::Text(needle.to_lowercase()));
        }

        sql.push_str(" ORDER BY r.created_at DESC, r.uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_summary_row(self.conn, row)?);
        }
        Ok(items)
    }

    fn update_details(&self, id: RecipeId, details: &RecipeDetails) -> RepoResult<()> {
        validate_title(&details.title)?;

        let changed = self
            .conn
            .execute(
                "UPDATE recipes
                 SET title = ?2,
                     summary = ?3,
                     notes = ?4,
                     servings = ?5,
                     prep_minutes = ?6,
                     cook_minutes = ?7,
                     updated_at = ?8
                 WHERE uuid = ?1;",
                params![
                    id.to_string(),
                    details.title.as_str(),
                    details.summary.as_deref(),
                    details.notes.as_deref(),
                    details.servings,
                    details.prep_minutes,
                    details.cook_minutes,
                    now_epoch_ms(),
                ],
            )
            .map_err(|err| map_write_error(err, "update recipe"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "recipe",
                id,
            });
        }
        Ok(())
    }

    fn delete_recipe(&self, id: RecipeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM recipes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "recipe",
                id,
            });
        }
        Ok(())
    }

    fn add_ingredient(&self, recipe_id: RecipeId, ingredient: &Ingredient) -> RepoResult<()> {
        let tx = self.begin()?;
        ensure_recipe_exists(&tx, recipe_id)?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM ingredients WHERE recipe_uuid = ?1;",
            [recipe_id.to_string()],
            |row| row.get(0),
        )?;
        ingredient.validate_at(position as usize)?;
        insert_ingredient_row(&tx, recipe_id, position, ingredient)?;
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    fn remove_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> RepoResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute(
            "DELETE FROM ingredients WHERE uuid = ?2 AND recipe_uuid = ?1;",
            params![recipe_id.to_string(), ingredient_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "ingredient",
                id: ingredient_id,
            });
        }
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    fn set_tags(&self, recipe_id: RecipeId, tags: &[String]) -> RepoResult<()> {
        for label in tags {
            ensure_normalized_tag(label)?;
        }

        let tx = self.begin()?;
        ensure_recipe_exists(&tx, recipe_id)?;
        replace_tags(&tx, recipe_id, tags)?;
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self, owner: OwnerFilter) -> RepoResult<Vec<String>> {
        let mut sql = String::from(
            "SELECT DISTINCT t.label
             FROM tags t
             INNER JOIN recipe_tags rt ON rt.tag_id = t.id
             INNER JOIN recipes r ON r.uuid = rt.recipe_uuid
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        match owner {
            OwnerFilter::Any => {}
            OwnerFilter::Owner(owner) => {
                sql.push_str(" AND r.owner_uuid = ?");
                bind_values.push(Value::Text(owner.to_string()));
            }
            OwnerFilter::Unowned => sql.push_str(" AND r.owner_uuid IS NULL"),
        }
        sql.push_str(" ORDER BY t.label COLLATE NOCASE ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }

    fn add_media(&self, recipe_id: RecipeId, media: &Media) -> RepoResult<()> {
        if !media.has_location() {
            return Err(RecipeValidationError::MediaWithoutLocation { index: 0 }.into());
        }

        let tx = self.begin()?;
        ensure_recipe_exists(&tx, recipe_id)?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM media WHERE recipe_uuid = ?1;",
            [recipe_id.to_string()],
            |row| row.get(0),
        )?;
        insert_media_row(&tx, recipe_id, position, media)?;
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    fn remove_media(&self, recipe_id: RecipeId, media_id: MediaId) -> RepoResult<Media> {
        let tx = self.begin()?;
        let removed = load_media(&tx, recipe_id)?
            .into_iter()
            .find(|media| media.id == media_id)
            .ok_or(RepoError::NotFound {
                entity: "media",
                id: media_id,
            })?;
        tx.execute(
            "DELETE FROM media WHERE uuid = ?2 AND recipe_uuid = ?1;",
            params![recipe_id.to_string(), media_id.to_string()],
        )?;
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(removed)
    }

    fn assign_owner(&self, recipe_id: RecipeId, owner: Option<UserId>) -> RepoResult<()> {
        if let Some(owner) = owner {
            ensure_user_exists(self.conn, owner)?;
        }
        let changed = self.conn.execute(
            "UPDATE recipes SET owner_uuid = ?2 WHERE uuid = ?1;",
            params![recipe_id.to_string(), owner.map(|id| id.to_string())],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "recipe",
                id: recipe_id,
            });
        }
        Ok(())
    }

    fn adopt_unowned(&self, owner: UserId) -> RepoResult<usize> {
        ensure_user_exists(self.conn, owner)?;
        let changed = self.conn.execute(
            "UPDATE recipes SET owner_uuid = ?1 WHERE owner_uuid IS NULL;",
            [owner.to_string()],
        )?;
        Ok(changed)
    }

    fn reassign_legacy_owned(&self, owner: UserId) -> RepoResult<usize> {
        ensure_user_exists(self.conn, owner)?;
        let changed = self.conn.execute(
            "UPDATE recipes
             SET owner_uuid = ?1
             WHERE owner_uuid IN (
                SELECT uuid
                FROM users
                WHERE external_id IS NULL
                  AND uuid <> ?1
             );",
            [owner.to_string()],
        )?;
        Ok(changed)
    }
}

fn ensure_user_exists(conn: &Connection, user_id: UserId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
        [user_id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::NotFound {
            entity: "user",
            id: user_id,
        });
    }
    Ok(())
}

fn insert_ingredient_row(
    conn: &Connection,
    recipe_id: RecipeId,
    position: i64,
    ingredient: &Ingredient,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO ingredients (uuid, recipe_uuid, position, name, quantity, unit, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            ingredient.id.to_string(),
            recipe_id.to_string(),
            position,
            ingredient.name.as_str(),
            ingredient.quantity,
            ingredient.unit.map(UnitOfMeasure::as_str),
            ingredient.note.as_deref(),
        ],
    )
    .map_err(|err| map_write_error(err, "insert ingredient"))?;
    Ok(())
}

fn insert_media_row(
    conn: &Connection,
    recipe_id: RecipeId,
    position: i64,
    media: &Media,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO media (
            uuid,
            recipe_uuid,
            position,
            kind,
            local_path,
            remote_url,
            thumbnail,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            media.id.to_string(),
            recipe_id.to_string(),
            position,
            media.kind.as_str(),
            media.local_path.as_deref(),
            media.remote_url.as_deref(),
            media.thumbnail.as_deref(),
            media.created_at,
        ],
    )
    .map_err(|err| map_write_error(err, "insert media"))?;
    Ok(())
}

fn replace_tags(conn: &Connection, recipe_id: RecipeId, tags: &[String]) -> RepoResult<()> {
    let recipe_text = recipe_id.to_string();
    conn.execute(
        "DELETE FROM recipe_tags WHERE recipe_uuid = ?1;",
        [recipe_text.as_str()],
    )?;

    for label in tags {
        conn.execute(
            "INSERT OR IGNORE INTO tags (label) VALUES (?1);",
            [label.as_str()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO recipe_tags (recipe_uuid, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE label = ?2 COLLATE NOCASE;",
            params![recipe_text.as_str(), label.as_str()],
        )?;
    }
    Ok(())
}

fn load_ingredients(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<Ingredient>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, name, quantity, unit, note
         FROM ingredients
         WHERE recipe_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([recipe_id.to_string()])?;
    let mut ingredients = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        let unit = match row.get::<_, Option<String>>("unit")? {
            Some(value) => Some(UnitOfMeasure::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid unit `{value}` in ingredients.unit"))
            })?),
            None => None,
        };
        ingredients.push(Ingredient {
            id: parse_uuid(&uuid_text, "ingredients.uuid")?,
            name: row.get("name")?,
            quantity: row.get("quantity")?,
            unit,
            note: row.get("note")?,
        });
    }
    Ok(ingredients)
}

fn load_tags(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.label
         FROM recipe_tags rt
         INNER JOIN tags t ON t.id = rt.tag_id
         WHERE rt.recipe_uuid = ?1
         ORDER BY t.label COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([recipe_id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

fn load_media(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<Media>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, kind, local_path, remote_url, thumbnail, created_at
         FROM media
         WHERE recipe_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([recipe_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        let kind_text: String = row.get("kind")?;
        let kind = MediaKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid media kind `{kind_text}` in media.kind"))
        })?;
        items.push(Media {
            id: parse_uuid(&uuid_text, "media.uuid")?,
            kind,
            local_path: row.get("local_path")?,
            remote_url: row.get("remote_url")?,
            thumbnail: row.get("thumbnail")?,
            created_at: row.get("created_at")?,
        });
    }
    Ok(items)
}

fn parse_owner(row: &Row<'_>) -> RepoResult<Option<UserId>> {
    row.get::<_, Option<String>>("owner_uuid")?
        .map(|value| parse_uuid(&value, "recipes.owner_uuid"))
        .transpose()
}

fn parse_recipe_row(row: &Row<'_>) -> RepoResult<Recipe> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Recipe {
        id: parse_uuid(&uuid_text, "recipes.uuid")?,
        owner_id: parse_owner(row)?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        notes: row.get("notes")?,
        servings: row.get("servings")?,
        prep_minutes: row.get("prep_minutes")?,
        cook_minutes: row.get("cook_minutes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        ingredients: Vec::new(),
        steps: Vec::new(),
        tags: Vec::new(),
        media: Vec::new(),
    })
}

fn parse_summary_row(conn: &Connection, row: &Row<'_>) -> RepoResult<RecipeSummary> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "recipes.uuid")?;
    Ok(RecipeSummary {
        id,
        owner_id: parse_owner(row)?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: load_tags(conn, id)?,
        ingredient_count: row.get("ingredient_count")?,
        step_count: row.get("step_count")?,
        cover_thumbnail: row.get("cover_thumbnail")?,
    })
}
