use log::{debug, info, warn};

use crate::{
    catalog::{CatalogClient, CatalogTrack, error::CatalogError},
    domain::track::Track,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    /// the track carries a fresh, non-empty preview URL
    Resolved,
    /// no strategy produced a preview, the track is returned unchanged
    NoPreview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub track: Track,
    pub status: ResolveStatus,
}

impl Resolution {
    pub fn resolved(track: Track) -> Self {
        Self {
            track,
            status: ResolveStatus::Resolved,
        }
    }

    pub fn no_preview(track: Track) -> Self {
        Self {
            track,
            status: ResolveStatus::NoPreview,
        }
    }

    pub fn preview_url(&self) -> Option<&str> {
        match self.status {
            ResolveStatus::Resolved => self.track.preview_url(),
            ResolveStatus::NoPreview => None,
        }
    }
}

/// Refreshes the playable preview of a track.
///
/// Never fails: every error ends up as [`ResolveStatus::NoPreview`].
pub trait TrackResolver {
    fn resolve(&self, track: &Track) -> Resolution;
}

/// Resolves previews against the external catalog:
/// direct lookup by catalog id first, then a metadata search.
pub struct CatalogResolver<C> {
    catalog: C,
}

impl<C: CatalogClient> CatalogResolver<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    fn by_catalog_id(&self, track: &Track) -> Option<Track> {
        let catalog_id = track.catalog_id()?;

        match self.catalog.lookup_by_id(catalog_id) {
            Ok(found) => {
                let preview = found.preview_url()?.to_string();
                let mut updated = track.clone();
                updated.preview = Some(preview);
                updated.artwork = found.artwork.or(updated.artwork);
                Some(updated)
            }
            Err(e) => {
                Self::log_step_failure("lookup by id", track, &e);
                None
            }
        }
    }

    fn by_metadata(&self, track: &Track) -> Option<Track> {
        let result =
            self.catalog
                .search_by_metadata(&track.title, &track.artist, track.album_name());

        match result {
            Ok(found) => Self::refresh_from_search(track, found),
            Err(e) => {
                Self::log_step_failure("metadata search", track, &e);
                None
            }
        }
    }

    fn refresh_from_search(track: &Track, found: CatalogTrack) -> Option<Track> {
        let preview = found.preview_url()?.to_string();
        let mut updated = track.clone();
        updated.preview = Some(preview);
        updated.artwork = found.artwork.or(updated.artwork);
        updated.catalog_id = Some(found.catalog_id);
        Some(updated)
    }

    fn log_step_failure(step: &str, track: &Track, error: &CatalogError) {
        match error {
            CatalogError::NotFound(_) => debug!("{step} found nothing for track {}", track.id),
            _ => warn!("{step} failed for track {}: {error}", track.id),
        }
    }
}

impl<C: CatalogClient> TrackResolver for CatalogResolver<C> {
    fn resolve(&self, track: &Track) -> Resolution {
        if let Some(updated) = self.by_catalog_id(track) {
            debug!("track {} resolved by catalog id", track.id);
            return Resolution::resolved(updated);
        }

        if let Some(updated) = self.by_metadata(track) {
            debug!("track {} resolved by metadata search", track.id);
            return Resolution::resolved(updated);
        }

        info!("no preview available for track {} ({})", track.id, track.title);
        Resolution::no_preview(track.clone())
    }
}
