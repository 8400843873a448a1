use crate::upload::{FILE_TOO_LARGE_COPY, UNSUPPORTED_MEDIA_TYPE_COPY};

/// Terminal stream failure delivered through the error callback of a stream
/// attempt.
///
/// Cancellation is deliberately absent: a caller-initiated cancel never
/// reaches the error callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Connection-level failure on the push-connection transport.
    #[error("connection error: {message}")]
    Connection { message: String },
    /// Non-2xx response before any stream body was read.
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    /// 2xx response whose body produced no bytes.
    #[error("response had no readable body")]
    NoBody,
    /// Malformed frame payload on a transport that cannot skip frames.
    #[error("parse error: {message}")]
    Parse { message: String },
    /// Well-formed terminal payload missing a required field.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
    /// Upload rejected with HTTP 413, or a local size check failed.
    #[error("{}", FILE_TOO_LARGE_COPY)]
    FileTooLarge,
    /// Upload rejected with HTTP 415, or a local MIME check failed.
    #[error("{}", UNSUPPORTED_MEDIA_TYPE_COPY)]
    UnsupportedMediaType,
    /// Uncaught failure while the stream body was being read.
    #[error("stream error: {message}")]
    Stream { message: String },
    /// Business-logic failure reported by the server, passed through verbatim.
    #[error("server error ({code}): {detail}")]
    Server { code: String, detail: String },
}

impl StreamError {
    /// Creates a connection-level error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error, mapping upload-specific statuses to
    /// their user-facing variants.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        match status {
            413 => Self::FileTooLarge,
            415 => Self::UnsupportedMediaType,
            _ => Self::Http {
                status,
                message: message.into(),
            },
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a mid-stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Creates a pass-through server error.
    pub fn server(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

/// Failure raised while opening a streaming transport, before any frame has
/// been received.
///
/// This is the only failure that may trigger the non-streaming fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpenError {
    /// The request could not be sent at all.
    #[error("transport open failed: {message}")]
    Transport { message: String },
    /// The server answered synchronously with a non-2xx status.
    #[error("transport open rejected with status {status}: {message}")]
    Http { status: u16, message: String },
    /// The selected transport cannot carry this kind of stream.
    #[error("transport does not support this stream: {message}")]
    Unsupported { message: String },
}

impl OpenError {
    /// Creates a transport-level open error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an HTTP-status open error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an unsupported-stream open error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}

/// Chunk-level failure produced by a transport byte stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The underlying connection failed (push-connection transport).
    #[error("connection failed: {message}")]
    Connection { message: String },
    /// Reading the response body failed (readable-response transport).
    #[error("read failed: {message}")]
    Read { message: String },
}

impl TransportError {
    /// Creates a connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a body-read failure.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }
}

impl From<TransportError> for StreamError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Connection { message } => StreamError::Connection { message },
            TransportError::Read { message } => StreamError::Stream { message },
        }
    }
}

/// Failure of an action accept/cancel call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The server rejected the resolution (already resolved, expired, or
    /// unknown proposal). Surfaced to the user as-is, never retried.
    #[error("action rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// The request never produced a server answer.
    #[error("action request failed: {0}")]
    Transport(String),
    /// The server answer could not be decoded.
    #[error("action response invalid: {0}")]
    Decode(String),
}

/// Top-level error for the non-streaming client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input, including local upload checks.
    #[error("validation error: {0}")]
    Validation(String),
    /// Non-2xx response from a request/response call.
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    /// Request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// The follow-up fetch that materializes a completed draft failed.
    ///
    /// Kept distinct from extraction failure: the extraction itself
    /// succeeded, only the result fetch did not.
    #[error("result materialization failed: {message}")]
    DraftMaterialization { message: String },
}

impl ClientError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a draft-materialization error.
    pub fn materialization(message: impl Into<String>) -> Self {
        Self::DraftMaterialization {
            message: message.into(),
        }
    }
}
