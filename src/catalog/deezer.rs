//! Deezer public API client

use std::time::Duration;

use log::debug;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    catalog::{CatalogClient, CatalogTrack, error::CatalogError},
    config::CatalogConfig,
    domain::track::{ArtworkRef, CatalogId},
};

const USER_AGENT: &str = concat!("tunequiz/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct DeezerTrack {
    id: u64,
    title: String,
    artist: DeezerArtist,
    album: Option<DeezerAlbum>,
    #[serde(default)]
    preview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeezerAlbum {
    title: String,
    #[serde(default)]
    cover_medium: Option<String>,
}

/// Deezer reports most failures with status 200 and an `error` member
#[derive(Debug, Deserialize)]
struct DeezerErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupResponse {
    Error { error: DeezerErrorBody },
    Track(DeezerTrack),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<DeezerTrack>,
    #[serde(default)]
    error: Option<DeezerErrorBody>,
}

impl From<DeezerTrack> for CatalogTrack {
    fn from(track: DeezerTrack) -> Self {
        let (album, artwork) = match track.album {
            Some(album) => (Some(album.title), album.cover_medium.map(ArtworkRef)),
            None => (None, None),
        };
        CatalogTrack {
            catalog_id: CatalogId(track.id.to_string()),
            title: track.title,
            artist: track.artist.name,
            album,
            artwork,
            preview: track.preview,
        }
    }
}

impl DeezerErrorBody {
    fn describe(&self) -> String {
        format!(
            "{}: {}",
            self.kind.as_deref().unwrap_or("error"),
            self.message.as_deref().unwrap_or("no message")
        )
    }
}

/// Prefer an exact (case insensitive) title and artist match, else the first result.
fn pick_best_match(results: Vec<DeezerTrack>, title: &str, artist: &str) -> Option<DeezerTrack> {
    let title = title.to_lowercase();
    let artist = artist.to_lowercase();

    let exact = results.iter().position(|track| {
        track.title.to_lowercase() == title && track.artist.name.to_lowercase() == artist
    });

    let mut results = results;
    match exact {
        Some(i) => Some(results.swap_remove(i)),
        None if !results.is_empty() => Some(results.swap_remove(0)),
        None => None,
    }
}

fn metadata_query(title: &str, artist: &str, album: Option<&str>) -> String {
    match album {
        Some(album) => format!("{title} {artist} {album}"),
        None => format!("{title} {artist}"),
    }
}

pub struct DeezerClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl DeezerClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url} {query:?}");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Transport(format!("{url} returned {status}")));
        }

        response
            .json()
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }

    fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<DeezerTrack>, CatalogError> {
        let limit = limit.to_string();
        let response: SearchResponse =
            self.get_json("/search/track", &[("q", query), ("limit", &limit)])?;

        if let Some(error) = response.error {
            return Err(CatalogError::Transport(error.describe()));
        }
        Ok(response.data)
    }
}

impl CatalogClient for DeezerClient {
    fn lookup_by_id(&self, catalog_id: &CatalogId) -> Result<CatalogTrack, CatalogError> {
        let response: LookupResponse = self.get_json(&format!("/track/{catalog_id}"), &[])?;

        match response {
            LookupResponse::Track(track) => Ok(track.into()),
            LookupResponse::Error { error } => {
                debug!("lookup of {catalog_id} failed: {}", error.describe());
                Err(CatalogError::NotFound(catalog_id.to_string()))
            }
        }
    }

    fn search_by_metadata(
        &self,
        title: &str,
        artist: &str,
        album: Option<&str>,
    ) -> Result<CatalogTrack, CatalogError> {
        let query = metadata_query(title, artist, album);
        let results = self.search_tracks(&query, 25)?;

        pick_best_match(results, title, artist)
            .map(CatalogTrack::from)
            .ok_or(CatalogError::NotFound(query))
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError> {
        Ok(self
            .search_tracks(query, limit)?
            .into_iter()
            .map(CatalogTrack::from)
            .collect())
    }
}
