use culinova_core::db::open_db_in_memory;
use culinova_core::{
    ImageStore, MediaError, MediaKind, RecipeDraft, RecipeListQuery, RecipeService,
    RecipeServiceError, SqliteRecipeRepository,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use uuid::Uuid;

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([240, 190, 60]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

#[test]
fn adding_a_photo_increments_media_count_and_sets_cover() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("media"));
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let recipe = service.create_recipe(RecipeDraft::titled("Lemon tart")).unwrap();
    let before = recipe.media.len();

    let media = service
        .add_photo(&store, recipe.id, &jpeg_bytes(300, 200))
        .unwrap();

    let loaded = service.get_recipe(recipe.id).unwrap().unwrap();
    assert_eq!(loaded.media.len(), before + 1);
    assert_eq!(loaded.media[0].id, media.id);
    assert_eq!(loaded.media[0].kind, MediaKind::Photo);

    let path = loaded.media[0].local_path.clone().unwrap();
    assert!(path.ends_with(".png"));
    assert!(Path::new(&path).exists());

    let thumbnail = loaded.media[0].thumbnail.clone().unwrap();
    let decoded = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (128, 85));

    let listed = service.list_recipes(RecipeListQuery::default()).unwrap();
    assert_eq!(listed.items[0].cover_thumbnail.as_deref(), Some(&thumbnail[..]));
}

#[test]
fn missing_image_data_is_reported_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("media"));
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let recipe = service.create_recipe(RecipeDraft::titled("Scones")).unwrap();

    let err = service.add_photo(&store, recipe.id, &[]).unwrap_err();
    assert!(matches!(err, RecipeServiceError::Media(MediaError::Empty)));
    assert_eq!(err.to_string(), "image data is missing");

    let loaded = service.get_recipe(recipe.id).unwrap().unwrap();
    assert!(loaded.media.is_empty());
    assert!(!store.dir().exists());
}

#[test]
fn photo_for_unknown_recipe_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("media"));
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());

    let err = service
        .add_photo(&store, Uuid::new_v4(), &jpeg_bytes(10, 10))
        .unwrap_err();
    assert!(matches!(err, RecipeServiceError::RecipeNotFound(_)));
    assert!(!store.dir().exists());
}

#[test]
fn remote_media_and_removal() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("media"));
    let conn = open_db_in_memory().unwrap();
    let service = RecipeService::new(SqliteRecipeRepository::try_new(&conn).unwrap());
    let recipe = service.create_recipe(RecipeDraft::titled("Paella")).unwrap();

    let video = service
        .add_media(recipe.id, MediaKind::Video, "https://cdn.example.com/paella.mp4")
        .unwrap();
    let photo = service
        .add_photo(&store, recipe.id, &jpeg_bytes(64, 64))
        .unwrap();
    assert_eq!(service.get_recipe(recipe.id).unwrap().unwrap().media.len(), 2);

    let removed = service.remove_media(&store, recipe.id, photo.id).unwrap();
    let photo_path = removed.local_path.unwrap();
    assert!(!Path::new(&photo_path).exists());

    let loaded = service.get_recipe(recipe.id).unwrap().unwrap();
    assert_eq!(loaded.media.len(), 1);
    assert_eq!(loaded.media[0].id, video.id);
    assert_eq!(
        loaded.media[0].remote_url.as_deref(),
        Some("https://cdn.example.com/paella.mp4")
    );

    let err = service.add_media(recipe.id, MediaKind::Photo, "  ").unwrap_err();
    assert!(matches!(err, RecipeServiceError::Validation(_)));
}
