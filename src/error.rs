use std::io;

/// Errors reported by zlib streams and their providers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The stream protocol was used out of order, e.g. draining a stream that needs input.
    #[error("protocol violation: {0}")]
    Protocol(&'static str),

    /// A buffer handed to the native backend is not one contiguous region of memory.
    #[error("'{0}' must be directly addressable")]
    InvalidBufferKind(&'static str),

    /// The compressed data is corrupt. The stream must be reset before it is used again.
    #[error("malformed zlib stream")]
    Malformed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The native zlib library reported a failure other than corrupt input.
    #[error("native zlib failure {code}: {message}")]
    Native {
        /// The zlib return code.
        code: i32,
        /// The message zlib attached to the stream, if any.
        message: String,
    },

    /// The software codec reported a failure other than corrupt input.
    #[error("codec failure: {0}")]
    Codec(String),

    /// The stream was used after [`ZStream::close`](crate::ZStream::close).
    #[error("stream is closed")]
    Closed,

    /// A configuration option could not be applied.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Alias for results returned by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match &error {
            Error::Malformed(_) => io::ErrorKind::InvalidData,
            Error::InvalidBufferKind(_) | Error::Config(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, error)
    }
}
