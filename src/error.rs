use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdinetError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("EDINET API key is not configured")]
    MissingCredential,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] FromUtf8Error),

    #[error(
        "Unexpected content type from URL {url}. Expected pattern {expected_pattern}, but got Content-Type: {got_content_type}. Content preview: {content_preview}..."
    )]
    UnexpectedContentType {
        url: String,
        expected_pattern: String,
        got_content_type: String,
        content_preview: String,
    },
}

#[cfg(feature = "sections")]
impl From<quick_xml::Error> for EdinetError {
    fn from(error: quick_xml::Error) -> Self {
        EdinetError::XmlError(error.to_string())
    }
}

#[cfg(feature = "discovery")]
impl From<zip::result::ZipError> for EdinetError {
    fn from(error: zip::result::ZipError) -> Self {
        EdinetError::ArchiveError(error.to_string())
    }
}

impl From<chrono::ParseError> for EdinetError {
    fn from(error: chrono::ParseError) -> Self {
        EdinetError::InvalidDate(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EdinetError>;
