//! Ordered recipe step repository.
//!
//! # Responsibility
//! - Persist step insert/edit/delete/move for one recipe.
//! - Rewrite `step_order` after every structural change.
//!
//! # Invariants
//! - After any write, a recipe's steps carry orders `1..=n` with no gaps.
//! - Each structural write runs in one immediate transaction.
//! - Listing is deterministic: `step_order ASC, uuid ASC`.

use crate::db::{ensure_tables, now_epoch_ms};
use crate::model::recipe::{RecipeId, Step, StepId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for ordered steps.
pub trait StepRepository {
    fn list_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<Step>>;
    /// Appends at `max(order) + 1`.
    fn append_step(
        &self,
        recipe_id: RecipeId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<Step>;
    /// Inserts at 1-based `position`, clamped to `1..=n+1`.
    fn insert_step(
        &self,
        recipe_id: RecipeId,
        position: u32,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<Step>;
    fn update_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<()>;
    /// Deletes one step and returns the renumbered remainder.
    fn delete_step(&self, recipe_id: RecipeId, step_id: StepId) -> RepoResult<Vec<Step>>;
    /// Moves one step to 1-based `target_position` (clamped) and returns the
    /// renumbered list.
    fn move_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        target_position: u32,
    ) -> RepoResult<Vec<Step>>;
    /// Closes gaps left by external writes.
    fn renumber_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<Step>>;
}

/// SQLite-backed step repository.
pub struct SqliteStepRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStepRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["recipes", "steps"])?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn insert_at(
        &self,
        recipe_id: RecipeId,
        position: Option<u32>,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<Step> {
        let tx = self.begin()?;
        ensure_recipe_exists(&tx, recipe_id)?;

        let mut ordered = list_step_ids(&tx, recipe_id)?;
        let index = match position {
            Some(position) => (position.max(1) as usize - 1).min(ordered.len()),
            None => ordered.len(),
        };

        let mut step = Step::new(index as u32 + 1, text);
        step.timer_seconds = timer_seconds;
        insert_step_row(&tx, recipe_id, &step)?;
        ordered.insert(index, step.id);
        write_orders(&tx, &ordered)?;
        touch_recipe(&tx, recipe_id)?;

        tx.commit()?;
        Ok(step)
    }
}

impl StepRepository for SqliteStepRepository<'_> {
    fn list_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<Step>> {
        load_steps(self.conn, recipe_id)
    }

    fn append_step(
        &self,
        recipe_id: RecipeId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<Step> {
        self.insert_at(recipe_id, None, text, timer_seconds)
    }

    fn insert_step(
        &self,
        recipe_id: RecipeId,
        position: u32,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<Step> {
        self.insert_at(recipe_id, Some(position), text, timer_seconds)
    }

    fn update_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        text: &str,
        timer_seconds: Option<u32>,
    ) -> RepoResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute(
            "UPDATE steps
             SET text = ?3,
                 timer_seconds = ?4
             WHERE uuid = ?2
               AND recipe_uuid = ?1;",
            params![
                recipe_id.to_string(),
                step_id.to_string(),
                text,
                timer_seconds
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "step",
                id: step_id,
            });
        }
        touch_recipe(&tx, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_step(&self, recipe_id: RecipeId, step_id: StepId) -> RepoResult<Vec<Step>> {
        let tx = self.begin()?;
        let changed = tx.execute(
            "DELETE FROM steps WHERE uuid = ?2 AND recipe_uuid = ?1;",
            params![recipe_id.to_string(), step_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "step",
                id: step_id,
            });
        }

        let ordered = list_step_ids(&tx, recipe_id)?;
        write_orders(&tx, &ordered)?;
        touch_recipe(&tx, recipe_id)?;
        let steps = load_steps(&tx, recipe_id)?;
        tx.commit()?;
        Ok(steps)
    }

    fn move_step(
        &self,
        recipe_id: RecipeId,
        step_id: StepId,
        target_position: u32,
    ) -> RepoResult<Vec<Step>> {
        let tx = self.begin()?;
        let mut ordered = list_step_ids(&tx, recipe_id)?;
        let Some(current_index) = ordered.iter().position(|id| *id == step_id) else {
            return Err(RepoError::NotFound {
                entity: "step",
                id: step_id,
            });
        };

        ordered.remove(current_index);
        let target_index = (target_position.max(1) as usize - 1).min(ordered.len());
        ordered.insert(target_index, step_id);

        write_orders(&tx, &ordered)?;
        touch_recipe(&tx, recipe_id)?;
        let steps = load_steps(&tx, recipe_id)?;
        tx.commit()?;
        Ok(steps)
    }

    fn renumber_steps(&self, recipe_id: RecipeId) -> RepoResult<Vec<Step>> {
        let tx = self.begin()?;
        ensure_recipe_exists(&tx, recipe_id)?;
        let ordered = list_step_ids(&tx, recipe_id)?;
        write_orders(&tx, &ordered)?;
        let steps = load_steps(&tx, recipe_id)?;
        tx.commit()?;
        Ok(steps)
    }
}

/// Inserts one step row verbatim. Callers own order bookkeeping.
pub(crate) fn insert_step_row(conn: &Connection, recipe_id: RecipeId, step: &Step) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO steps (uuid, recipe_uuid, step_order, text, timer_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            step.id.to_string(),
            recipe_id.to_string(),
            step.order,
            step.text.as_str(),
            step.timer_seconds,
        ],
    )?;
    Ok(())
}

/// Loads steps ordered by `step_order`.
pub(crate) fn load_steps(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<Step>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, step_order, text, timer_seconds
         FROM steps
         WHERE recipe_uuid = ?1
         ORDER BY step_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([recipe_id.to_string()])?;
    let mut steps = Vec::new();
    while let Some(row) = rows.next()? {
        steps.push(parse_step_row(row)?);
    }
    Ok(steps)
}

pub(crate) fn ensure_recipe_exists(conn: &Connection, recipe_id: RecipeId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM recipes WHERE uuid = ?1);",
        [recipe_id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::NotFound {
            entity: "recipe",
            id: recipe_id,
        });
    }
    Ok(())
}

/// Bumps `updated_at` on a recipe after a child-row change.
pub(crate) fn touch_recipe(conn: &Connection, recipe_id: RecipeId) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE recipes SET updated_at = ?2 WHERE uuid = ?1;",
        params![recipe_id.to_string(), now_epoch_ms()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "recipe",
            id: recipe_id,
        });
    }
    Ok(())
}

fn list_step_ids(conn: &Connection, recipe_id: RecipeId) -> RepoResult<Vec<StepId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM steps
         WHERE recipe_uuid = ?1
         ORDER BY step_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([recipe_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "steps.uuid")?);
    }
    Ok(ids)
}

fn write_orders(conn: &Connection, ordered: &[StepId]) -> RepoResult<()> {
    let mut stmt = conn.prepare("UPDATE steps SET step_order = ?2 WHERE uuid = ?1;")?;
    for (index, id) in ordered.iter().enumerate() {
        stmt.execute(params![id.to_string(), index as i64 + 1])?;
    }
    Ok(())
}

fn parse_step_row(row: &Row<'_>) -> RepoResult<Step> {
    let uuid_text: String = row.get("uuid")?;
    let order: i64 = row.get("step_order")?;
    let order = u32::try_from(order).map_err(|_| {
        RepoError::InvalidData(format!("invalid step order `{order}` in steps.step_order"))
    })?;
    Ok(Step {
        id: parse_uuid(&uuid_text, "steps.uuid")?,
        order,
        text: row.get("text")?,
        timer_seconds: row.get("timer_seconds")?,
    })
}
