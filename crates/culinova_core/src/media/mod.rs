//! Local image storage for recipe photos.
//!
//! # Responsibility
//! - Persist full-size photos as files next to the database.
//! - Derive small PNG thumbnails that are stored inline with media rows.

mod image_store;

pub use image_store::{
    thumbnail_png, ImageStore, MediaError, MediaResult, StoredImage, MAX_IMAGE_BYTES,
    THUMBNAIL_EDGE,
};
