//! File-backed image store and thumbnail encoder.
//!
//! # Invariants
//! - Stored files are always PNG and named `<uuid>.png`.
//! - Files are written to a temp name and renamed, so readers never observe
//!   a partially written image.
//! - Thumbnails fit in `THUMBNAIL_EDGE`×`THUMBNAIL_EDGE` and keep aspect ratio.

use image::{DynamicImage, ImageFormat, ImageReader};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Largest accepted input payload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// Longest thumbnail edge in pixels.
pub const THUMBNAIL_EDGE: u32 = 128;

const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug)]
pub enum MediaError {
    /// Payload had no bytes.
    Empty,
    TooLarge { size: usize, max: usize },
    UnsupportedFormat(String),
    Decode(String),
    Encode(String),
    NotFound(PathBuf),
    Io(std::io::Error),
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "image data is missing"),
            Self::TooLarge { size, max } => {
                write!(f, "image is too large: {size} bytes (max {max})")
            }
            Self::UnsupportedFormat(format) => {
                write!(f, "unsupported image format: {format}; allowed: PNG, JPEG, GIF, WebP")
            }
            Self::Decode(message) => write!(f, "failed to decode image: {message}"),
            Self::Encode(message) => write!(f, "failed to encode image: {message}"),
            Self::NotFound(path) => write!(f, "image file not found: {}", path.display()),
            Self::Io(err) => write!(f, "image storage io error: {err}"),
        }
    }
}

impl Error for MediaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Result of storing one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: Uuid,
    pub path: PathBuf,
    pub thumbnail: Vec<u8>,
}

/// Directory of full-size photo files.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// The directory is created lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decodes `bytes`, writes a PNG copy and returns it with its thumbnail.
    pub fn save(&self, bytes: &[u8]) -> MediaResult<StoredImage> {
        let image = decode(bytes)?;
        let full = encode_png(&image)?;
        let thumbnail = encode_png(&image.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE))?;

        fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4();
        let path = self.dir.join(format!("{id}.png"));
        let tmp_path = self.dir.join(format!(".{id}.png.tmp"));
        if let Err(err) = fs::write(&tmp_path, &full).and_then(|_| fs::rename(&tmp_path, &path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        log::info!(
            "event=image_store module=media status=ok bytes={} thumb_bytes={}",
            full.len(),
            thumbnail.len()
        );
        Ok(StoredImage {
            id,
            path,
            thumbnail,
        })
    }

    pub fn load(&self, path: &Path) -> MediaResult<Vec<u8>> {
        fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => MediaError::NotFound(path.to_path_buf()),
            _ => MediaError::Io(err),
        })
    }

    /// Removes a stored file. Missing files are not an error.
    pub fn remove(&self, path: &Path) -> MediaResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Encodes a PNG thumbnail that fits in `THUMBNAIL_EDGE` pixels.
pub fn thumbnail_png(bytes: &[u8]) -> MediaResult<Vec<u8>> {
    let image = decode(bytes)?;
    encode_png(&image.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE))
}

fn decode(bytes: &[u8]) -> MediaResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(MediaError::TooLarge {
            size: bytes.len(),
            max: MAX_IMAGE_BYTES,
        });
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| MediaError::Decode(err.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| MediaError::UnsupportedFormat("unknown".to_string()))?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(MediaError::UnsupportedFormat(format!("{format:?}")));
    }

    reader
        .decode()
        .map_err(|err| MediaError::Decode(err.to_string()))
}

fn encode_png(image: &DynamicImage) -> MediaResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|err| MediaError::Encode(err.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 80, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode sample");
        buf.into_inner()
    }

    #[test]
    fn thumbnail_fits_edge_and_keeps_aspect() {
        let thumb = thumbnail_png(&sample_png(512, 256)).expect("thumbnail");
        let decoded = image::load_from_memory(&thumb).expect("decode thumbnail");
        assert_eq!(decoded.width(), 128);
        assert_eq!(decoded.height(), 64);
    }

    #[test]
    fn rejects_empty_and_garbage_payloads() {
        assert!(matches!(thumbnail_png(&[]), Err(MediaError::Empty)));
        assert!(thumbnail_png(b"definitely not an image").is_err());
    }

    #[test]
    fn save_writes_png_file_and_load_reads_it_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::new(dir.path().join("photos"));

        let stored = store.save(&sample_png(40, 30)).expect("save");
        assert_eq!(
            stored.path.file_name().and_then(|name| name.to_str()),
            Some(format!("{}.png", stored.id).as_str())
        );
        let bytes = store.load(&stored.path).expect("load");
        assert_eq!(image::guess_format(&bytes).ok(), Some(ImageFormat::Png));

        store.remove(&stored.path).expect("remove");
        assert!(matches!(
            store.load(&stored.path),
            Err(MediaError::NotFound(_))
        ));
    }
}
