use culinova_core::db::open_db_in_memory;
use culinova_core::{
    AuthIdentity, AuthProvider, OwnerFilter, Recipe, RecipeListQuery, RecipeRepository,
    SessionChange, SessionError, SessionService, SqliteRecipeRepository, SqliteUserRepository,
    User, UserRepository,
};
use std::sync::{Arc, Mutex};

fn google(uid: &str) -> AuthIdentity {
    AuthIdentity::new(uid, AuthProvider::Google)
}

#[test]
fn first_sign_in_creates_user_from_identity() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    let identity = google("AbCuid42").with_display_name("Anna Cook");
    let user = session
        .handle_auth_state(&users, Some(&identity))
        .unwrap()
        .unwrap();

    assert_eq!(user.username, "abcuid42");
    assert_eq!(user.external_id.as_deref(), Some("AbCuid42"));
    assert_eq!(user.display_name.as_deref(), Some("Anna Cook"));
    assert_eq!(session.current_user(), Some(&user));

    let stored = users.find_by_external_id("AbCuid42").unwrap().unwrap();
    assert_eq!(stored, user);
    let credentials = users.list_credentials(user.id).unwrap();
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0].provider, AuthProvider::Google);
    assert_eq!(credentials[0].external_id.as_deref(), Some("AbCuid42"));
}

#[test]
fn repeated_notifications_reuse_the_same_record() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    let first = session
        .handle_auth_state(&users, Some(&google("uid-7")))
        .unwrap()
        .unwrap();
    let second = session
        .handle_auth_state(&users, Some(&google("uid-7")))
        .unwrap()
        .unwrap();
    assert_eq!(first.id, second.id);

    let user_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(user_rows, 1);
    assert_eq!(users.list_credentials(first.id).unwrap().len(), 1);

    session
        .handle_auth_state(&users, Some(&AuthIdentity::new("uid-7", AuthProvider::Apple)))
        .unwrap();
    assert_eq!(users.list_credentials(first.id).unwrap().len(), 2);
}

#[test]
fn legacy_record_is_backfilled_instead_of_duplicated() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let legacy = User::new("uid-legacy");
    users.create_user(&legacy).unwrap();
    assert!(legacy.is_legacy());

    let mut session = SessionService::new();
    let user = session
        .handle_auth_state(&users, Some(&google("UID-Legacy")))
        .unwrap()
        .unwrap();

    assert_eq!(user.id, legacy.id);
    assert_eq!(user.external_id.as_deref(), Some("UID-Legacy"));
    assert!(users.list_legacy_users().unwrap().is_empty());
}

#[test]
fn username_taken_by_another_account_gets_a_suffix() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    let upper = session
        .handle_auth_state(&users, Some(&google("CaseUID")))
        .unwrap()
        .unwrap();
    let lower = session
        .handle_auth_state(&users, Some(&google("caseuid")))
        .unwrap()
        .unwrap();

    assert_ne!(upper.id, lower.id);
    assert_eq!(upper.username, "caseuid");
    assert!(lower.username.starts_with("caseuid-"));
}

#[test]
fn signed_out_notification_clears_current_user() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    session
        .handle_auth_state(&users, Some(&google("uid-1")))
        .unwrap();
    assert!(session.current_user().is_some());

    let result = session.handle_auth_state(&users, None).unwrap();
    assert!(result.is_none());
    assert!(session.current_user().is_none());
}

#[test]
fn blank_identity_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    let err = session
        .handle_auth_state(&users, Some(&google("   ")))
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidIdentity(_)));
    assert!(session.current_user().is_none());
}

#[test]
fn subscribers_see_changes_until_unsubscribed() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let mut session = SessionService::new();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = session.subscribe(move |change| {
        let label = match change {
            SessionChange::SignedIn(user) => format!("in:{}", user.username),
            SessionChange::SignedOut => "out".to_string(),
        };
        sink.lock().unwrap().push(label);
    });

    session
        .handle_auth_state(&users, Some(&google("uid-a")))
        .unwrap();
    session
        .handle_auth_state(&users, Some(&google("uid-a")))
        .unwrap();
    session.sign_out();
    assert!(session.unsubscribe(subscription));
    assert!(!session.unsubscribe(subscription));
    session
        .handle_auth_state(&users, Some(&google("uid-b")))
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["in:uid-a".to_string(), "out".to_string()]
    );
    assert_eq!(session.subscriber_count(), 0);
}

#[test]
fn reload_collection_adopts_stray_recipes() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let recipes = SqliteRecipeRepository::try_new(&conn).unwrap();

    let legacy = User::new("old-device-user");
    users.create_user(&legacy).unwrap();
    let other = User::for_external_identity("someone-else", None);
    users.create_user(&other).unwrap();

    let mut unowned = Recipe::new("Unowned Bread");
    unowned.created_at = 1_000;
    recipes.create_recipe(&unowned).unwrap();
    let mut legacy_owned = Recipe::new("Legacy Soup");
    legacy_owned.owner_id = Some(legacy.id);
    legacy_owned.created_at = 2_000;
    recipes.create_recipe(&legacy_owned).unwrap();
    let mut foreign = Recipe::new("Foreign Cake");
    foreign.owner_id = Some(other.id);
    recipes.create_recipe(&foreign).unwrap();

    let mut session = SessionService::new();
    let err = session
        .reload_collection(&recipes, RecipeListQuery::default())
        .unwrap_err();
    assert!(matches!(err, SessionError::NotSignedIn));

    let me = session
        .handle_auth_state(&users, Some(&google("me-uid")))
        .unwrap()
        .unwrap();
    let listed = session
        .reload_collection(&recipes, RecipeListQuery::default())
        .unwrap();
    let titles = listed
        .iter()
        .map(|item| item.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Legacy Soup", "Unowned Bread"]);
    assert!(listed.iter().all(|item| item.owner_id == Some(me.id)));

    let foreign_loaded = recipes.get_recipe(foreign.id).unwrap().unwrap();
    assert_eq!(foreign_loaded.owner_id, Some(other.id));
    assert!(recipes
        .list_recipes(&RecipeListQuery {
            owner: OwnerFilter::Unowned,
            ..RecipeListQuery::default()
        })
        .unwrap()
        .is_empty());
}

#[test]
fn reload_collection_applies_title_filter() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let recipes = SqliteRecipeRepository::try_new(&conn).unwrap();
    recipes.create_recipe(&Recipe::new("Apple Pie")).unwrap();
    recipes.create_recipe(&Recipe::new("Cherry Pie")).unwrap();
    recipes.create_recipe(&Recipe::new("Lasagna")).unwrap();

    let mut session = SessionService::new();
    session
        .handle_auth_state(&users, Some(&google("baker")))
        .unwrap();
    let pies = session
        .reload_collection(
            &recipes,
            RecipeListQuery {
                title_contains: Some("pie".to_string()),
                ..RecipeListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(pies.len(), 2);
}
