use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Error, Debug)]
pub enum ScrapingError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// Conversion implementations for common error types
impl From<std::io::Error> for ScrapingError {
    fn from(err: std::io::Error) -> Self {
        ScrapingError::ExportError(err.to_string())
    }
}

impl From<serde_json::Error> for ScrapingError {
    fn from(err: serde_json::Error) -> Self {
        ScrapingError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for ScrapingError {
    fn from(err: toml::de::Error) -> Self {
        ScrapingError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for ScrapingError {
    fn from(err: reqwest::Error) -> Self {
        ScrapingError::NetworkError(err.to_string())
    }
}

impl From<csv::Error> for ScrapingError {
    fn from(err: csv::Error) -> Self {
        ScrapingError::ExportError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ScrapingError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ScrapingError::ExportError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ScrapingError {
    fn from(err: calamine::XlsxError) -> Self {
        ScrapingError::ExportError(err.to_string())
    }
}
