use lms_types::{EntityId, IdError, TextError};

#[derive(Debug, thiserror::Error)]
pub enum LmsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid entity id: {0}")]
    InvalidId(#[from] IdError),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),

    #[error("unknown entity {id} in scope {scope}")]
    UnknownEntity { id: EntityId, scope: String },
    #[error("entity {id} already exists in scope {scope}")]
    DuplicateEntity { id: EntityId, scope: String },
    #[error("entity {id} is listed more than once in a single order write")]
    DuplicatePatch { id: EntityId },

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize: {0}")]
    Deserialization(serde_json::Error),
}

pub type LmsResult<T> = std::result::Result<T, LmsError>;
