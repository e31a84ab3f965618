use rusqlite::Connection;

pub mod tables {
    pub const QUIZZES: &str = "quizzes";
    pub const QUIZ_TRACKS: &str = "quiz_tracks";

    pub const ALL_TABLES: &[&str] = &[QUIZZES, QUIZ_TRACKS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const OWNER: &str = "owner";
    pub const CREATED_AT: &str = "created_at";

    pub const QUIZ_ID: &str = "quiz_id";
    pub const POSITION: &str = "position";
    pub const TRACK_ID: &str = "track_id";
    pub const ARTIST: &str = "artist";
    pub const ALBUM: &str = "album";
    pub const ARTWORK: &str = "artwork";
    pub const PREVIEW: &str = "preview";
    pub const CATALOG_ID: &str = "catalog_id";
}

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS quizzes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    owner TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS quiz_tracks (
    quiz_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    track_id TEXT NOT NULL,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    album TEXT,
    artwork TEXT,
    preview TEXT,
    catalog_id TEXT,
    PRIMARY KEY (quiz_id, position),
    UNIQUE (quiz_id, track_id)
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
