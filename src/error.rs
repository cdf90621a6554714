//! Error types for the URI filesystem layer.

/// Error reported by a storage backend.
///
/// Backends are free to use their own error vocabulary (`std::io::Error`,
/// a `thiserror` enum, ...). The facade and the stream adapters wrap every
/// such error into [`FsError::Io`], keeping it as the error source.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Filesystem error type.
///
/// Backend failures of any kind are normalized into [`FsError::Io`], so callers
/// never need to know backend-specific error types. The other variants are
/// raised locally by this crate.
///
/// # Examples
///
/// ```rust
/// use anyfs_uri::FsError;
///
/// let err = FsError::NotSupported { operation: "fileno" };
/// assert_eq!(err.to_string(), "operation not supported: fileno");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// A backend operation failed.
    #[error("{operation} failed for {uri}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The URI involved in the operation.
        uri: String,
        /// The backend's own error.
        #[source]
        source: BackendError,
    },

    /// The backend accepted fewer bytes than requested.
    #[error("write failed for {uri}: short write ({written} of {expected} bytes)")]
    ShortWrite {
        /// The URI being written.
        uri: String,
        /// Bytes the backend reported as written.
        written: usize,
        /// Bytes the caller asked to write.
        expected: usize,
    },

    /// The operation cannot be provided by this stream model.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// The stream has already been closed.
    #[error("stream closed: {uri}")]
    Closed {
        /// The URI the stream was opened on.
        uri: String,
    },

    /// The stream was not opened for writing.
    #[error("stream not opened for writing: {uri}")]
    NotWritable {
        /// The URI the stream was opened on.
        uri: String,
    },

    /// Content is not valid UTF-8.
    #[error("invalid data: {uri} ({details})")]
    InvalidData {
        /// The URI with invalid data.
        uri: String,
        /// Details about the invalid data.
        details: String,
    },

    /// Only `file://` URIs can be turned into local paths.
    #[error("unsupported scheme for local access: {uri}")]
    UnsupportedScheme {
        /// The rejected URI.
        uri: String,
    },

    /// A URI could not be parsed or joined.
    #[error("invalid uri: {uri} ({reason})")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A mode string could not be parsed.
    #[error("invalid open mode: {mode:?}")]
    InvalidMode {
        /// The rejected mode string.
        mode: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl FsError {
    /// Wrap a backend error for `operation` on `uri`.
    pub(crate) fn io(operation: &'static str, uri: &str, source: BackendError) -> Self {
        FsError::Io {
            operation,
            uri: uri.to_owned(),
            source,
        }
    }

    /// Returns `true` for errors that originate from the backend.
    pub fn is_io(&self) -> bool {
        matches!(self, FsError::Io { .. } | FsError::ShortWrite { .. })
    }
}
