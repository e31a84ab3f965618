use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifier of a track inside one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

/// Identifier of a track in the external music catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkRef(pub String);

/// Represent a music track of a quiz
///
/// The preview URL may be missing or stale; the resolver refreshes it
/// before a question is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<ArtworkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(rename = "deezerId", default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<CatalogId>,
}

impl Track {
    pub fn new(id: &str, title: &str, artist: &str) -> Self {
        Self {
            id: TrackId(id.to_string()),
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            artwork: None,
            preview: None,
            catalog_id: None,
        }
    }

    /// preview URL, if present and non-empty
    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// album name, if present and non-empty
    pub fn album_name(&self) -> Option<&str> {
        self.album.as_deref().filter(|album| !album.trim().is_empty())
    }

    /// catalog id, if present and non-empty
    pub fn catalog_id(&self) -> Option<&CatalogId> {
        self.catalog_id.as_ref().filter(|id| !id.0.trim().is_empty())
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
