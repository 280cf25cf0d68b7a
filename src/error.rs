use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to decode DICOM data: {0}")]
    Decode(String),

    #[error("Pixel data contains no samples")]
    EmptyGrid,

    #[error("Invalid window: center {center}, width {width}")]
    InvalidWindow { center: f64, width: f64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Stable classification of [`Error`] for the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    EmptyGrid,
    InvalidWindow,
    NotFound,
    Io,
    Session,
    Encode,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(_) => ErrorKind::Decode,
            Error::EmptyGrid => ErrorKind::EmptyGrid,
            Error::InvalidWindow { .. } => ErrorKind::InvalidWindow,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Io(_) => ErrorKind::Io,
            Error::Session(_) => ErrorKind::Session,
            Error::Encode(_) => ErrorKind::Encode,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// True for failures caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Decode
                | ErrorKind::EmptyGrid
                | ErrorKind::InvalidWindow
                | ErrorKind::NotFound
                | ErrorKind::Session
        )
    }
}
