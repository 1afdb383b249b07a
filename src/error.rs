use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DbError {
    #[error("Environment variable {0} must be set and non-empty")]
    MissingVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Database error: {0}")]
    Driver(#[from] libsql::Error),

    #[error("Session requested off the thread that built the engine")]
    ThreadAffinity,

    #[error("Row decode error: {0}")]
    Decode(String),
}

impl DbError {
    /// True for failures raised while reading settings, before any engine exists.
    pub fn is_config(&self) -> bool {
        matches!(self, DbError::MissingVar(_) | DbError::Config(_))
    }
}
