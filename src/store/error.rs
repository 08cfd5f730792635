use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local database I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("local database is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0} value must not be empty")]
    EmptyValue(String),

    #[error("remote store returned no row for insert into {0}")]
    EmptyInsert(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
