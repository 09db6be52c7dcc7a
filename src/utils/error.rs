use thiserror::Error;

/// Failure to turn a listing page into a price snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not find product title")]
    TitleNotFound,

    #[error("Could not find product price")]
    PriceNotFound,

    #[error("Could not parse price: {text:?}")]
    PriceParseError { text: String },

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        ExtractionError::NetworkError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt value in column {column} for {url}")]
    CorruptRow { url: String, column: &'static str },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A refresh cycle is already in progress")]
    RefreshInProgress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(PersistenceError::Database(err))
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
