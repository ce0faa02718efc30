use culinova_core::db::open_db_in_memory;
use culinova_core::{
    OwnerFilter, RecipeDraft, RecipeListQuery, RecipeRepository, RecipeService,
    RecipeServiceError, RepoError, SqliteRecipeRepository, SqliteUserRepository, User,
    UserRepository,
};

#[test]
fn set_tags_normalizes_and_replaces_whole_set() {
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let recipe = service.create_recipe(RecipeDraft::titled("Curry")).unwrap();

    let tagged = service
        .set_tags(
            recipe.id,
            vec![" Spicy ".to_string(), "VEGAN".to_string(), "spicy".to_string()],
        )
        .unwrap();
    assert_eq!(tagged.tags, vec!["spicy".to_string(), "vegan".to_string()]);

    let replaced = service
        .set_tags(recipe.id, vec!["Dinner".to_string()])
        .unwrap();
    assert_eq!(replaced.tags, vec!["dinner".to_string()]);

    let cleared = service.set_tags(recipe.id, Vec::new()).unwrap();
    assert!(cleared.tags.is_empty());
}

#[test]
fn blank_tag_is_rejected_and_keeps_existing_set() {
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let mut draft = RecipeDraft::titled("Risotto");
    draft.tags = vec!["italian".to_string()];
    let recipe = service.create_recipe(draft).unwrap();

    let err = service
        .set_tags(recipe.id, vec!["rice".to_string(), "   ".to_string()])
        .unwrap_err();
    assert!(matches!(err, RecipeServiceError::InvalidTag(_)));

    let loaded = service.get_recipe(recipe.id).unwrap().unwrap();
    assert_eq!(loaded.tags, vec!["italian".to_string()]);
}

#[test]
fn repository_rejects_unnormalized_labels() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecipeRepository::try_new(&conn).unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let recipe = service.create_recipe(RecipeDraft::titled("Tacos")).unwrap();

    let err = repo
        .set_tags(recipe.id, &["Mexican".to_string()])
        .unwrap_err();
    assert!(matches!(err, RepoError::RecipeValidation(_)));
}

#[test]
fn tags_are_shared_case_insensitively_across_recipes() {
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());

    let mut first = RecipeDraft::titled("Pho");
    first.tags = vec!["Soup".to_string()];
    service.create_recipe(first).unwrap();
    let mut second = RecipeDraft::titled("Ramen");
    second.tags = vec!["soup".to_string(), "noodles".to_string()];
    service.create_recipe(second).unwrap();

    let tag_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tag_rows, 2);

    let soups = service
        .list_recipes(RecipeListQuery {
            tag: Some(" SOUP ".to_string()),
            ..RecipeListQuery::default()
        })
        .unwrap();
    assert_eq!(soups.items.len(), 2);

    let noodles = service
        .list_recipes(RecipeListQuery {
            tag: Some("noodles".to_string()),
            ..RecipeListQuery::default()
        })
        .unwrap();
    assert_eq!(noodles.items.len(), 1);
    assert_eq!(noodles.items[0].title, "Ramen");
}

#[test]
fn list_tags_is_scoped_to_owner() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let anna = User::new("anna");
    let ben = User::new("ben");
    users.create_user(&anna).unwrap();
    users.create_user(&ben).unwrap();

    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let mut draft = RecipeDraft::titled("Gazpacho");
    draft.owner_id = Some(anna.id);
    draft.tags = vec!["summer".to_string(), "cold".to_string()];
    service.create_recipe(draft).unwrap();
    let mut draft = RecipeDraft::titled("Goulash");
    draft.owner_id = Some(ben.id);
    draft.tags = vec!["winter".to_string()];
    service.create_recipe(draft).unwrap();

    assert_eq!(
        service.list_tags(OwnerFilter::Owner(anna.id)).unwrap(),
        vec!["cold".to_string(), "summer".to_string()]
    );
    assert_eq!(
        service.list_tags(OwnerFilter::Any).unwrap(),
        vec!["cold".to_string(), "summer".to_string(), "winter".to_string()]
    );
    assert!(service.list_tags(OwnerFilter::Unowned).unwrap().is_empty());
}
