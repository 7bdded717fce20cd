use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed sequence file: {0}")]
    MalformedIndex(String),

    #[error("corrupt index file: {0}")]
    CorruptIndex(String),

    #[error("contig not found: {0}")]
    NotFound(String),

    #[error("range [{begin}, {end}) is out of range for {contig} ({length} bp)")]
    OutOfRange {
        contig: String,
        begin: i64,
        end: i64,
        length: u64,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("requested {requested} bases, limit is {limit}")]
    PayloadTooLarge { requested: i64, limit: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedIndex(_) => "MalformedIndexError",
            Error::CorruptIndex(_) => "CorruptIndexError",
            Error::NotFound(_) => "NotFoundError",
            Error::OutOfRange { .. } => "OutOfRangeError",
            Error::Validation(_) => "ValidationError",
            Error::PayloadTooLarge { .. } => "PayloadTooLargeError",
            Error::Io(_) | Error::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::OutOfRange { .. } | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MalformedIndex(_)
            | Error::CorruptIndex(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors never leak detail to the caller: the kind and message go to the
/// server log, the response carries only the status code.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }
        status.into_response()
    }
}
