use crate::domain::quiz::{NewQuiz, Quiz, QuizId, QuizSummary};
use crate::storage::error::StorageError;

pub mod db;
pub mod error;
pub mod operations;
pub(crate) mod schema;

/// Persistence of quizzes.
///
/// The play engine only ever calls `get_quiz`; the rest serves the
/// authoring side (CLI import, HTTP API).
pub trait QuizStore {
    fn get_quiz(&mut self, id: &QuizId) -> Result<Quiz, StorageError>;

    /// newest first
    fn list_quizzes(&mut self) -> Result<Vec<QuizSummary>, StorageError>;

    /// validates the quiz, assigns an id and a creation time
    fn insert_quiz(&mut self, quiz: NewQuiz) -> Result<Quiz, StorageError>;

    fn delete_quiz(&mut self, id: &QuizId) -> Result<(), StorageError>;
}
