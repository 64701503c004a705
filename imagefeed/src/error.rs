use thiserror::Error;
use tokio::sync::{mpsc::error::SendError, oneshot::error::RecvError};

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds of a single HTTP round-trip.
///
/// Every transport reports exactly one of these; the services above it never
/// retry on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response body: {0}")]
    Decoding(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}: {1}")]
    Context(String, Box<Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Url parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Tokio task-related error: {0}")]
    Tokio(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("An unexpected error occurred: {0}")]
    Other(String),
}

impl Error {
    /// The network failure behind this error, looking through context layers.
    pub fn network(&self) -> Option<&NetworkError> {
        match self {
            Error::Network(e) => Some(e),
            Error::Context(_, inner) => inner.network(),
            _ => None,
        }
    }
}

impl<T> From<SendError<T>> for Error {
    fn from(e: SendError<T>) -> Self {
        Error::Tokio(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Tokio(e.to_string())
    }
}

impl From<RecvError> for Error {
    fn from(e: RecvError) -> Self {
        Error::Tokio(e.to_string())
    }
}

pub trait Context<T, E> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e.into())))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
