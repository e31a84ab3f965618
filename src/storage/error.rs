use thiserror::Error;

use crate::domain::quiz::QuizId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),

    #[error("invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
