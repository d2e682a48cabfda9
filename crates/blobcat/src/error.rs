//! Error types for resolving and fetching.

use std::io;
use std::sync::Arc;

use blobcat_core::ContentId;
use blobcat_store::StoreError;
use thiserror::Error;

/// Errors that can occur during resolve and fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The descriptor carries no usable content identifier.
    #[error("no content identifier recorded in descriptor {digest:?}")]
    Resolution { digest: String },

    /// The size query failed or printed something that is not a size.
    #[error("failed to query size of {cid}: {source}")]
    SizeQuery {
        cid: ContentId,
        #[source]
        source: StoreError,
    },

    /// The requested offset lies past the end of the object.
    #[error("offset is larger than the size of the blob {offset}(offset) > {size}(blob size)")]
    Range { offset: u64, size: u64 },

    /// A read was cut short while another process held the store lock.
    ///
    /// Recovered by retrying; never delivered to a reader.
    #[error("store lock held by another process (attempt {attempt}): {stderr}")]
    TransientLock { attempt: u32, stderr: String },

    /// A read failed for good.
    #[error(
        "failed to copy {cid} (offset:{offset},length:{length},delivered:{delivered},attempts:{attempts}): {source}"
    )]
    Transfer {
        cid: ContentId,
        offset: u64,
        length: u64,
        /// Bytes of the range handed to the reader before the failure.
        delivered: u64,
        /// Read attempts made, including the first.
        attempts: u32,
        /// Stderr of the final attempt.
        stderr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A store query failed; the store's error is passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FetchError {
    /// Wrap into an `io::Error` for delivery through a reader.
    ///
    /// The kind of an underlying I/O failure is kept, so a truncated read
    /// still reports `UnexpectedEof`. The error is shared so a reader can
    /// hand the same failure back on every later read.
    pub fn into_io(self) -> io::Error {
        let kind = match &self {
            FetchError::Transfer { source, .. } => source
                .downcast_ref::<io::Error>()
                .map(io::Error::kind)
                .unwrap_or(io::ErrorKind::Other),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, Arc::new(self))
    }

    /// The `FetchError` inside an error returned by a reader, if any.
    pub fn from_io(err: &io::Error) -> Option<&FetchError> {
        let inner = err.get_ref()?;
        inner
            .downcast_ref::<Arc<FetchError>>()
            .map(Arc::as_ref)
            .or_else(|| inner.downcast_ref::<FetchError>())
    }

    /// The shared handle inside an error built by [`into_io`](Self::into_io).
    pub(crate) fn shared_from_io(err: &io::Error) -> Option<Arc<FetchError>> {
        err.get_ref()?.downcast_ref::<Arc<FetchError>>().cloned()
    }
}

/// Result type for resolve and fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
