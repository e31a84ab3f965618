use std::{collections::HashSet, fmt::Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::track::Track;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub String);

impl Display for QuizId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered, named collection of tracks.
///
/// Track order is question order. Read-only once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tracks: Vec<Track>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub owner: String,
}

impl Quiz {
    pub fn is_playable(&self) -> bool {
        !self.tracks.is_empty()
    }
}

/// Quiz as submitted by the authoring flow, before it gets an id
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewQuiz {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tracks: Vec<Track>,
    #[serde(rename = "userId", default = "anonymous_owner")]
    pub owner: String,
}

fn anonymous_owner() -> String {
    "anonymous".to_string()
}

impl NewQuiz {
    /// checks the quiz invariants, returns a human readable reason on failure
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("quiz title is empty".to_string());
        }
        if self.tracks.is_empty() {
            return Err("quiz has no tracks".to_string());
        }

        let mut seen = HashSet::new();
        for track in &self.tracks {
            if track.title.trim().is_empty() {
                return Err(format!("track {} has an empty title", track.id));
            }
            if !seen.insert(&track.id) {
                return Err(format!("track id {} is used more than once", track.id));
            }
        }

        Ok(())
    }
}

/// Row of the quiz listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub track_count: usize,
    pub created_at: DateTime<Utc>,
}
