use thiserror::Error;

/// Errors that can occur when parsing, validating, serializing or resolving VAST documents
#[derive(Error, Debug)]
pub enum VastError {
    #[error("Failed to parse XML: {0}")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("[{0}] is not a valid VAST document.")]
    InvalidDocument(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("VAST is invalid: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Too many redirects were made.")]
    TooManyRedirects,

    /// Failure reported by the fetch capability, passed through untouched
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document does not fit the VAST model: {0}")]
    Model(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
}

impl VastError {
    /// Wrap an error raised while fetching a document
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        VastError::Transport(error.into())
    }

    /// True for errors caused by malformed or non-VAST input
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            VastError::XmlParseError(_) | VastError::InvalidDocument(_) | VastError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VastError>;
