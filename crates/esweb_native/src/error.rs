use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine data directory")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, Error>;
