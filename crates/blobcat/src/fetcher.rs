//! Fetcher: range reads, liveness checks and range ids for one CID.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use blobcat_core::{ContentId, RangeId};
use blobcat_store::ContentStore;
use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::transfer::Transfer;

/// The byte stream of one fetched range.
///
/// Reads block until the transfer task has produced the next chunk. A range
/// that ends early is reported as an error whose inner error is a
/// [`FetchError::Transfer`] (see [`FetchError::from_io`]), never as EOF.
/// Once failed, every later read returns the same error.
/// Dropping the reader cancels the transfer.
pub struct RangeReader {
    inner: StreamReader<ReceiverStream<io::Result<Bytes>>, Bytes>,
    failed: Option<Failure>,
}

/// The terminal error of a reader, kept so it can be reported again.
#[derive(Debug)]
struct Failure {
    kind: io::ErrorKind,
    error: Option<Arc<FetchError>>,
    message: String,
}

impl Failure {
    fn new(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            error: FetchError::shared_from_io(err),
            message: err.to_string(),
        }
    }

    fn to_io(&self) -> io::Error {
        match &self.error {
            Some(error) => io::Error::new(self.kind, Arc::clone(error)),
            None => io::Error::new(self.kind, self.message.clone()),
        }
    }
}

impl RangeReader {
    fn new(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            inner: StreamReader::new(ReceiverStream::new(rx)),
            failed: None,
        }
    }
}

impl AsyncRead for RangeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(failure) = &self.failed {
            return Poll::Ready(Err(failure.to_io()));
        }
        let result = ready!(Pin::new(&mut self.inner).poll_read(cx, buf));
        if let Err(e) = &result {
            self.failed = Some(Failure::new(e));
        }
        Poll::Ready(result)
    }
}

impl std::fmt::Debug for RangeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeReader")
            .field("failed", &self.failed.is_some())
            .finish_non_exhaustive()
    }
}

/// A resolved object: one CID and its total size.
///
/// Cloning is cheap. Each [`fetch`](Self::fetch) is independent and owns its
/// own store reads, so fetches may run concurrently.
pub struct Fetcher<S> {
    store: Arc<S>,
    cid: ContentId,
    size: u64,
    config: Arc<FetchConfig>,
}

impl<S> Clone for Fetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cid: self.cid.clone(),
            size: self.size,
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> std::fmt::Debug for Fetcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("cid", &self.cid)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<S: ContentStore + 'static> Fetcher<S> {
    /// Bind `cid` of known `size` to a store.
    pub fn new(store: Arc<S>, cid: ContentId, size: u64, config: FetchConfig) -> Self {
        Self {
            store,
            cid,
            size,
            config: Arc::new(config),
        }
    }

    /// The bound content identifier.
    pub fn cid(&self) -> &ContentId {
        &self.cid
    }

    /// Total size of the object in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Stream `length` bytes starting at `offset`.
    ///
    /// Fails immediately, without touching the store, if `offset` lies past
    /// the end of the object. Otherwise returns at once; the bytes are read
    /// by a task spawned on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn fetch(&self, offset: u64, length: u64) -> Result<RangeReader> {
        if offset > self.size {
            return Err(FetchError::Range {
                offset,
                size: self.size,
            });
        }

        let (tx, rx) = mpsc::channel(1);
        let transfer = Transfer::new(
            Arc::clone(&self.store),
            self.cid.clone(),
            offset,
            length,
            Arc::clone(&self.config),
            tx,
        );
        tokio::spawn(transfer.run());

        Ok(RangeReader::new(rx))
    }

    /// Check that the object is still reachable in the store.
    ///
    /// The store's error is returned unchanged as [`FetchError::Store`].
    pub async fn check(&self) -> Result<()> {
        self.store.stat(&self.cid).await.map_err(FetchError::Store)
    }

    /// Deterministic identifier of `[offset, offset+length)` of this object,
    /// as 64 lowercase hex characters.
    pub fn derive_id(&self, offset: u64, length: u64) -> String {
        RangeId::derive(&self.cid, offset, length).to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobcat_store::{CatCall, Fault, MemoryStore, StoreError};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn cid() -> ContentId {
        ContentId::parse("bafy123").unwrap()
    }

    fn content() -> Vec<u8> {
        (0..1000u32).map(|i| (i * 7 % 256) as u8).collect()
    }

    fn fetcher(store: &Arc<MemoryStore>, config: FetchConfig) -> Fetcher<MemoryStore> {
        Fetcher::new(Arc::clone(store), cid(), 1000, config)
    }

    fn fast() -> FetchConfig {
        FetchConfig {
            retry_backoff: Duration::ZERO,
            chunk_size: 128,
            ..FetchConfig::default()
        }
    }

    async fn read_all(mut reader: RangeReader) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await?;
        Ok(out)
    }

    #[tokio::test]
    async fn test_fetch_first_half() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        let f = fetcher(&store, FetchConfig::default());

        let out = read_all(f.fetch(0, 500).unwrap()).await.unwrap();
        assert_eq!(out.len(), 500);
        assert_eq!(out, &content()[..500]);
        assert_eq!(store.cat_calls(), vec![CatCall { offset: 0, length: 500 }]);
    }

    #[tokio::test]
    async fn test_fetch_at_end_is_empty() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        let f = fetcher(&store, FetchConfig::default());
        let out = read_all(f.fetch(1000, 0).unwrap()).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_offset_past_end_makes_no_calls() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        let f = fetcher(&store, FetchConfig::default());

        let err = f.fetch(1001, 1).unwrap_err();
        assert!(matches!(err, FetchError::Range { offset: 1001, size: 1000 }));
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_resumes_after_lock_contention() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        store.push_fault(Fault::lock_contention(100));
        store.push_fault(Fault::lock_contention(0));
        store.push_fault(Fault::lock_contention(250));
        let f = fetcher(&store, fast());

        let out = read_all(f.fetch(200, 500).unwrap()).await.unwrap();
        assert_eq!(out, &content()[200..700]);
        assert_eq!(
            store.cat_calls(),
            vec![
                CatCall { offset: 200, length: 500 },
                CatCall { offset: 300, length: 500 },
                CatCall { offset: 300, length: 500 },
                CatCall { offset: 550, length: 500 },
            ]
        );
    }

    #[tokio::test]
    async fn test_non_lock_failure_is_not_retried() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        store.push_fault(Fault::new(42, "Error: context deadline exceeded"));
        let f = fetcher(&store, fast());

        let err = read_all(f.fetch(0, 500).unwrap()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        match FetchError::from_io(&err) {
            Some(FetchError::Transfer {
                delivered,
                attempts,
                stderr,
                ..
            }) => {
                assert_eq!(*delivered, 42);
                assert_eq!(*attempts, 1);
                assert_eq!(stderr, "Error: context deadline exceeded");
            }
            other => panic!("expected transfer error, got {other:?}"),
        }
        assert_eq!(store.cat_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_error_is_sticky() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        store.push_fault(Fault::new(3, "Error: boom"));
        let mut reader = fetcher(&store, fast()).fetch(0, 100).unwrap();

        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).await.is_err());
        assert_eq!(out, &content()[..3]);

        let mut buf = [0u8; 8];
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(FetchError::from_io(&err).is_some());
    }

    #[tokio::test]
    async fn test_retry_ceiling() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        store.set_sticky_fault(Some(Fault::lock_contention(1)));
        let f = fetcher(
            &store,
            FetchConfig {
                max_retries: 3,
                ..fast()
            },
        );

        let err = read_all(f.fetch(0, 500).unwrap()).await.unwrap_err();
        assert!(matches!(
            FetchError::from_io(&err),
            Some(FetchError::Transfer {
                delivered: 4,
                attempts: 4,
                ..
            })
        ));
        let offsets: Vec<u64> = store.cat_calls().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_check_passes_store_error_through() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        let f = fetcher(&store, FetchConfig::default());
        f.check().await.unwrap();

        store.remove(&cid());
        let err = f.check().await.unwrap_err();
        match err {
            FetchError::Store(StoreError::CommandFailed { command, stderr, .. }) => {
                assert_eq!(command, "ipfs files stat /ipfs/bafy123");
                assert!(stderr.contains("does not exist"));
            }
            other => panic!("expected store error, got {other:?}"),
        }
        assert_eq!(store.stat_calls(), 2);
    }

    #[test]
    fn test_derive_id() {
        let store = Arc::new(MemoryStore::new());
        let f = fetcher(&store, FetchConfig::default());
        let id = f.derive_id(0, 500);
        assert_eq!(id, "0664e89765dcab600ab9a54a7b38490dd78d9af97846680caf2f5f1c2f641395");
        assert_eq!(id, f.clone().derive_id(0, 500));
        assert_ne!(id, f.derive_id(500, 500));
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_independent() {
        let store = Arc::new(MemoryStore::new().with_object(cid(), content()));
        let f = fetcher(&store, fast());

        let a = f.fetch(0, 400).unwrap();
        let b = f.fetch(400, 600).unwrap();
        let (a, b) = tokio::join!(read_all(a), read_all(b));
        assert_eq!(a.unwrap(), &content()[..400]);
        assert_eq!(b.unwrap(), &content()[400..]);
    }
}
