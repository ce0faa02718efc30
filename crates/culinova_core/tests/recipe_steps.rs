use culinova_core::db::open_db_in_memory;
use culinova_core::{
    Recipe, RecipeId, RecipeRepository, SqliteRecipeRepository, SqliteStepRepository, Step,
    StepRepository, StepService, StepServiceError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_recipe(conn: &Connection, texts: &[&str]) -> RecipeId {
    let repo = SqliteRecipeRepository::try_new(conn).unwrap();
    let mut recipe = Recipe::new("Focaccia");
    for text in texts {
        recipe.push_step(*text);
    }
    repo.create_recipe(&recipe).unwrap()
}

fn view(steps: &[Step]) -> Vec<(u32, &str)> {
    steps
        .iter()
        .map(|step| (step.order, step.text.as_str()))
        .collect()
}

#[test]
fn deleting_a_step_renumbers_remaining_steps() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["mix", "proof", "shape", "bake"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let steps = service.list_steps(recipe_id).unwrap();
    let remaining = service.delete_step(recipe_id, steps[1].id).unwrap();

    assert_eq!(view(&remaining), vec![(1, "mix"), (2, "shape"), (3, "bake")]);
    assert_eq!(view(&service.list_steps(recipe_id).unwrap()), view(&remaining));
}

#[test]
fn add_step_appends_after_last_order() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["mix"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let added = service.add_step(recipe_id, "  rest  ", Some(600)).unwrap();
    assert_eq!(added.order, 2);
    assert_eq!(added.text, "rest");
    assert_eq!(added.timer_seconds, Some(600));

    let err = service.add_step(recipe_id, "   ", None).unwrap_err();
    assert!(matches!(err, StepServiceError::BlankText));
    assert_eq!(service.list_steps(recipe_id).unwrap().len(), 2);
}

#[test]
fn insert_step_shifts_later_steps_and_clamps_position() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["a", "c"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let steps = service.insert_step(recipe_id, 2, "b", None).unwrap();
    assert_eq!(view(&steps), vec![(1, "a"), (2, "b"), (3, "c")]);

    let steps = service.insert_step(recipe_id, 0, "start", None).unwrap();
    assert_eq!(steps[0].text, "start");

    let steps = service.insert_step(recipe_id, 99, "end", None).unwrap();
    assert_eq!(
        view(&steps),
        vec![(1, "start"), (2, "a"), (3, "b"), (4, "c"), (5, "end")]
    );
}

#[test]
fn move_step_reorders_densely() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["one", "two", "three", "four"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    let steps = service.list_steps(recipe_id).unwrap();

    let moved = service.move_step(recipe_id, steps[3].id, 2).unwrap();
    assert_eq!(
        view(&moved),
        vec![(1, "one"), (2, "four"), (3, "two"), (4, "three")]
    );

    let moved = service.move_step(recipe_id, steps[0].id, 10).unwrap();
    assert_eq!(
        view(&moved),
        vec![(1, "four"), (2, "two"), (3, "three"), (4, "one")]
    );
}

#[test]
fn edit_step_updates_text_and_timer() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["boil"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    let step = service.list_steps(recipe_id).unwrap().remove(0);

    service
        .edit_step(recipe_id, step.id, "boil hard", Some(300))
        .unwrap();
    let edited = service.list_steps(recipe_id).unwrap().remove(0);
    assert_eq!(edited.text, "boil hard");
    assert_eq!(edited.timer_seconds, Some(300));
    assert_eq!(edited.order, 1);
}

#[test]
fn missing_recipe_and_step_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["only"]);
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let unknown_recipe = Uuid::new_v4();
    let err = service.add_step(unknown_recipe, "x", None).unwrap_err();
    assert!(matches!(err, StepServiceError::RecipeNotFound(id) if id == unknown_recipe));

    let unknown_step = Uuid::new_v4();
    let err = service.delete_step(recipe_id, unknown_step).unwrap_err();
    assert!(matches!(err, StepServiceError::StepNotFound(id) if id == unknown_step));
}

#[test]
fn renumber_closes_gaps_from_external_writes() {
    let conn = open_db_in_memory().unwrap();
    let recipe_id = seed_recipe(&conn, &["x", "y", "z"]);
    conn.execute(
        "UPDATE steps SET step_order = step_order * 10 WHERE recipe_uuid = ?1;",
        [recipe_id.to_string()],
    )
    .unwrap();

    let repo = SqliteStepRepository::try_new(&conn).unwrap();
    let steps = repo.renumber_steps(recipe_id).unwrap();
    assert_eq!(view(&steps), vec![(1, "x"), (2, "y"), (3, "z")]);
}
