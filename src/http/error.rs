use rouille::Response;

use crate::{catalog::error::CatalogError, storage::error::StorageError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuizNotFound(id) => ApiError::NotFound(format!("quiz {} not found", id)),

            StorageError::InvalidQuiz(reason) => ApiError::BadRequest(reason),

            StorageError::Database(_) | StorageError::Config(_) | StorageError::Internal(_) => {
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => {
                ApiError::NotFound(format!("no catalog track matches {what}"))
            }
            CatalogError::Transport(_) | CatalogError::Decode(_) => {
                ApiError::BadGateway("music catalog unavailable".into())
            }
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::BadGateway(_) => 502,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => Response::text(msg).with_status_code(status),
        }
    }
}
