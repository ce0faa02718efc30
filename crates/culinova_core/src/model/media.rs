//! Photo/video attachments.

use crate::db::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MediaId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Attachment on a recipe.
///
/// At least one of `local_path` / `remote_url` is expected; `thumbnail` holds
/// small PNG bytes for list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub kind: MediaKind,
    /// File in the app sandbox.
    pub local_path: Option<String>,
    /// Cloud/CDN location.
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbnail: Option<Vec<u8>>,
    pub created_at: i64,
}

impl Media {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            local_path: None,
            remote_url: None,
            thumbnail: None,
            created_at: now_epoch_ms(),
        }
    }

    /// Photo stored on device, with an optional precomputed thumbnail.
    pub fn local_photo(path: impl Into<String>, thumbnail: Option<Vec<u8>>) -> Self {
        let mut media = Self::new(MediaKind::Photo);
        media.local_path = Some(path.into());
        media.thumbnail = thumbnail;
        media
    }

    /// Whether the record points at any content.
    pub fn has_location(&self) -> bool {
        self.local_path.is_some() || self.remote_url.is_some()
    }
}
