use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog track matches {0}")]
    NotFound(String),

    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("unexpected catalog response: {0}")]
    Decode(String),
}
