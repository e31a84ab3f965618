//! External music catalog access.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::error::CatalogError,
    domain::track::{ArtworkRef, CatalogId},
};

pub mod deezer;
pub mod error;

/// Track as described by the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub catalog_id: CatalogId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub artwork: Option<ArtworkRef>,
    /// may be empty, the catalog does not offer previews for every track
    pub preview: Option<String>,
}

impl CatalogTrack {
    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_deref().filter(|url| !url.trim().is_empty())
    }
}

pub trait CatalogClient {
    fn lookup_by_id(&self, catalog_id: &CatalogId) -> Result<CatalogTrack, CatalogError>;

    /// best match for the given metadata
    fn search_by_metadata(
        &self,
        title: &str,
        artist: &str,
        album: Option<&str>,
    ) -> Result<CatalogTrack, CatalogError>;

    /// free text search, at most `limit` results
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for std::sync::Arc<C> {
    fn lookup_by_id(&self, catalog_id: &CatalogId) -> Result<CatalogTrack, CatalogError> {
        (**self).lookup_by_id(catalog_id)
    }

    fn search_by_metadata(
        &self,
        title: &str,
        artist: &str,
        album: Option<&str>,
    ) -> Result<CatalogTrack, CatalogError> {
        (**self).search_by_metadata(title, artist, album)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError> {
        (**self).search(query, limit)
    }
}
