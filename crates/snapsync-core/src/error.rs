use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Remote API unavailable: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Remote API returned HTTP {status} for {url}")]
    RemoteStatus { status: u16, url: String },

    #[error("Invalid remote payload: {0}")]
    Payload(String),

    #[error("{0}")]
    Other(String),
}
