use std::time::SystemTime;

use crate::{
    config,
    domain::{
        quiz::{NewQuiz, Quiz, QuizId, QuizSummary},
        track::{ArtworkRef, CatalogId, Track, TrackId},
    },
    storage::{
        QuizStore,
        db::{self, SecondsSinceUnix, i64_seconds_to_utc, system_time_to_i64},
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use log::{debug, info};
use rusqlite::{OptionalExtension, params};
use tables::*;

/// Quiz store backed by SQLite
pub struct SqliteStore {
    pub(crate) db: rusqlite::Connection,
}

struct QuizRow {
    id: String,
    title: String,
    description: Option<String>,
    owner: String,
    created_at: SecondsSinceUnix,
}

impl SqliteStore {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    fn new_quiz_id() -> QuizId {
        QuizId(format!("{:016x}", rand::random::<u64>()))
    }

    fn read_tracks(&self, quiz_id: &str) -> Result<Vec<Track>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {TRACK_ID}, {TITLE}, {ARTIST}, {ALBUM}, {ARTWORK}, {PREVIEW}, {CATALOG_ID}
             FROM {QUIZ_TRACKS} WHERE {QUIZ_ID} = ?1 ORDER BY {POSITION}"
        ))?;

        let tracks = stmt
            .query_map(params![quiz_id], |row| {
                Ok(Track {
                    id: TrackId(row.get(0)?),
                    title: row.get(1)?,
                    artist: row.get(2)?,
                    album: row.get(3)?,
                    artwork: row.get::<_, Option<String>>(4)?.map(ArtworkRef),
                    preview: row.get(5)?,
                    catalog_id: row.get::<_, Option<String>>(6)?.map(CatalogId),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tracks)
    }

    fn _insert_quiz(
        &mut self,
        quiz: NewQuiz,
        created_at: SystemTime,
    ) -> Result<Quiz, StorageError> {
        quiz.validate().map_err(StorageError::InvalidQuiz)?;

        let created_secs = system_time_to_i64(created_at).map_err(StorageError::Internal)?;
        let id = Self::new_quiz_id();

        let tx = self.db.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO {QUIZZES} ({ID}, {TITLE}, {DESCRIPTION}, {OWNER}, {CREATED_AT})
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![id.0, quiz.title, quiz.description, quiz.owner, created_secs],
        )?;

        for (position, track) in quiz.tracks.iter().enumerate() {
            tx.execute(
                &format!(
                    "INSERT INTO {QUIZ_TRACKS}
                     ({QUIZ_ID}, {POSITION}, {TRACK_ID}, {TITLE}, {ARTIST}, {ALBUM}, {ARTWORK}, {PREVIEW}, {CATALOG_ID})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    id.0,
                    position as i64,
                    track.id.0,
                    track.title,
                    track.artist,
                    track.album,
                    track.artwork.as_ref().map(|a| &a.0),
                    track.preview,
                    track.catalog_id.as_ref().map(|c| &c.0),
                ],
            )?;
        }
        tx.commit()?;

        info!("stored quiz {} with {} tracks", id, quiz.tracks.len());

        Ok(Quiz {
            id,
            title: quiz.title,
            description: quiz.description,
            tracks: quiz.tracks,
            created_at: i64_seconds_to_utc(created_secs).map_err(StorageError::Internal)?,
            owner: quiz.owner,
        })
    }
}

impl QuizStore for SqliteStore {
    fn get_quiz(&mut self, id: &QuizId) -> Result<Quiz, StorageError> {
        let row = self
            .db
            .query_row(
                &format!(
                    "SELECT {ID}, {TITLE}, {DESCRIPTION}, {OWNER}, {CREATED_AT}
                     FROM {QUIZZES} WHERE {ID} = ?1"
                ),
                params![id.0],
                |row| {
                    Ok(QuizRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        owner: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StorageError::QuizNotFound(id.clone()))?;

        let tracks = self.read_tracks(&row.id)?;
        debug!("loaded quiz {} ({} tracks)", row.id, tracks.len());

        Ok(Quiz {
            id: QuizId(row.id),
            title: row.title,
            description: row.description,
            tracks,
            created_at: i64_seconds_to_utc(row.created_at).map_err(StorageError::Internal)?,
            owner: row.owner,
        })
    }

    fn list_quizzes(&mut self) -> Result<Vec<QuizSummary>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT q.{ID}, q.{TITLE}, q.{DESCRIPTION}, q.{CREATED_AT}, COUNT(t.{TRACK_ID})
             FROM {QUIZZES} q LEFT JOIN {QUIZ_TRACKS} t ON t.{QUIZ_ID} = q.{ID}
             GROUP BY q.{ID}
             ORDER BY q.{CREATED_AT} DESC, q.rowid DESC"
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, SecondsSinceUnix>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, title, description, created_at, count)| {
                Ok(QuizSummary {
                    id: QuizId(id),
                    title,
                    description,
                    track_count: count as usize,
                    created_at: i64_seconds_to_utc(created_at)
                        .map_err(StorageError::Internal)?,
                })
            })
            .collect()
    }

    fn insert_quiz(&mut self, quiz: NewQuiz) -> Result<Quiz, StorageError> {
        self._insert_quiz(quiz, SystemTime::now())
    }

    fn delete_quiz(&mut self, id: &QuizId) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;
        tx.execute(
            &format!("DELETE FROM {QUIZ_TRACKS} WHERE {QUIZ_ID} = ?1"),
            params![id.0],
        )?;
        let removed = tx.execute(
            &format!("DELETE FROM {QUIZZES} WHERE {ID} = ?1"),
            params![id.0],
        )?;
        tx.commit()?;

        if removed == 0 {
            return Err(StorageError::QuizNotFound(id.clone()));
        }

        info!("deleted quiz {id}");
        Ok(())
    }
}
