use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldHashError {
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("salt generation failed: {0}")]
    Salt(String),

    #[error("hash failed: {0}")]
    Hash(String),

    #[error("compare failed: {0}")]
    Compare(String),

    #[error("hash task did not complete: {0}")]
    TaskJoin(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Query error: {0}")]
    Query(String),

    #[error("No string value at {0}")]
    NotAString(String),
}

impl FieldHashError {
    /// True for failures raised by the salt/hash/compare primitive.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Salt(_) | Self::Hash(_) | Self::Compare(_))
    }
}

impl From<tokio::task::JoinError> for FieldHashError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FieldHashError>;
