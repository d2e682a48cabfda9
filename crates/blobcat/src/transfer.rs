//! The background side of one fetch: read attempts, copy loop, and retry.
//!
//! A [`Transfer`] runs on its own task and feeds a bounded channel read by a
//! [`RangeReader`](crate::RangeReader). Each attempt starts a store read at
//! the cursor, always asking for the originally requested length, and copies
//! only what is still missing from the range. When an attempt is cut short
//! with the lock marker in its stderr, the cursor advances by the bytes that
//! attempt delivered and a new read is started.

use std::io;
use std::sync::Arc;

use blobcat_core::ContentId;
use blobcat_store::{CatReader, ContentStore};
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Sending half of the reader channel.
pub(crate) type ChunkSender = mpsc::Sender<io::Result<Bytes>>;

/// How one attempt's copy ended.
#[derive(Debug)]
enum CopyOutcome {
    /// Every missing byte of the range was delivered.
    Complete,
    /// The store stopped short after delivering `copied` bytes.
    Short { copied: u64, error: io::Error },
    /// The reader was dropped.
    Abandoned,
}

/// What to do after a short copy.
#[derive(Debug)]
enum Verdict {
    /// Transient lock contention; start another read.
    Retry(FetchError),
    /// Give up, reporting the final stderr.
    Fail(String),
}

/// State of one fetch, owned by its task.
pub(crate) struct Transfer<S> {
    store: Arc<S>,
    cid: ContentId,
    offset: u64,
    length: u64,
    config: Arc<FetchConfig>,
    tx: ChunkSender,
}

impl<S: ContentStore + 'static> Transfer<S> {
    pub(crate) fn new(
        store: Arc<S>,
        cid: ContentId,
        offset: u64,
        length: u64,
        config: Arc<FetchConfig>,
        tx: ChunkSender,
    ) -> Self {
        Self {
            store,
            cid,
            offset,
            length,
            config,
            tx,
        }
    }

    /// Drive the transfer to completion, failure, or abandonment.
    ///
    /// Returning drops the sender: after a completed range that is EOF to
    /// the reader, after a failure the error has already been queued ahead
    /// of it.
    pub(crate) async fn run(self) {
        let mut cursor = self.offset;
        let mut attempt: u32 = 0;

        loop {
            let delivered = cursor - self.offset;
            let remaining = self.length - delivered;

            let mut session = match self.store.cat(&self.cid, cursor, self.length).await {
                Ok(session) => session,
                Err(e) => {
                    self.fail(delivered, attempt, String::new(), Box::new(e)).await;
                    return;
                }
            };

            let outcome = self.copy(session.stdout(), remaining).await;
            let mut diagnostics = session.release();

            let (copied, error) = match outcome {
                CopyOutcome::Complete => {
                    tracing::trace!(
                        cid = %self.cid,
                        offset = self.offset,
                        length = self.length,
                        attempts = attempt + 1,
                        "range complete"
                    );
                    return;
                }
                CopyOutcome::Abandoned => {
                    tracing::trace!(cid = %self.cid, offset = self.offset, "reader dropped");
                    return;
                }
                CopyOutcome::Short { copied, error } => (copied, error),
            };

            let stderr = diagnostics.collect(self.config.stderr_grace).await;

            match self.classify(attempt, stderr) {
                Verdict::Retry(transient) => {
                    tracing::debug!(
                        cid = %self.cid,
                        offset = self.offset,
                        length = self.length,
                        actual_length = copied,
                        retry = attempt,
                        max_retries = self.config.max_retries,
                        error = %error,
                        reason = %transient,
                        "retrying copy"
                    );
                    if self.tx.is_closed() {
                        return;
                    }
                    tokio::time::sleep(self.config.retry_backoff).await;
                    cursor += copied;
                    attempt += 1;
                }
                Verdict::Fail(stderr) => {
                    self.fail(delivered + copied, attempt, stderr, Box::new(error))
                        .await;
                    return;
                }
            }
        }
    }

    /// Copy at most `remaining` bytes from `stdout` into the channel.
    async fn copy(&self, stdout: &mut CatReader, remaining: u64) -> CopyOutcome {
        let mut copied = 0u64;

        while copied < remaining {
            let want = (remaining - copied).min(self.config.chunk_size.max(1) as u64) as usize;
            let mut buf = vec![0u8; want];

            let n = match stdout.read(&mut buf).await {
                Ok(0) => {
                    let error = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("store read ended after {copied} of {remaining} bytes"),
                    );
                    return CopyOutcome::Short { copied, error };
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return CopyOutcome::Short { copied, error },
            };

            buf.truncate(n);
            if self.tx.send(Ok(Bytes::from(buf))).await.is_err() {
                return CopyOutcome::Abandoned;
            }
            copied += n as u64;
        }

        CopyOutcome::Complete
    }

    /// A short read is transient when its stderr carries the lock marker and
    /// retries remain. Otherwise the stderr is handed back for the failure.
    fn classify(&self, attempt: u32, stderr: String) -> Verdict {
        if attempt < self.config.max_retries && stderr.contains(&self.config.lock_marker) {
            Verdict::Retry(FetchError::TransientLock { attempt, stderr })
        } else {
            Verdict::Fail(stderr)
        }
    }

    async fn fail(
        &self,
        delivered: u64,
        attempt: u32,
        stderr: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) {
        let err = FetchError::Transfer {
            cid: self.cid.clone(),
            offset: self.offset,
            length: self.length,
            delivered,
            attempts: attempt + 1,
            stderr,
            source,
        };
        tracing::debug!(
            cid = %self.cid,
            offset = self.offset,
            length = self.length,
            actual_length = delivered,
            retry = attempt,
            max_retries = self.config.max_retries,
            error = %err,
            "failed to copy"
        );

        // The reader may already be gone; nothing left to tell.
        let _ = self.tx.send(Err(err.into_io())).await;
    }
}
