//! In-memory implementation of the ContentStore trait.
//!
//! This is primarily for testing. It answers queries the way the store CLI
//! does, and can be scripted to cut reads short with arbitrary stderr text,
//! which is how lock contention shows up from the real store.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::RwLock;

use async_trait::async_trait;
use blobcat_core::ContentId;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::session::{CatSession, Diagnostics};
use crate::traits::{ContentStore, LOCK_CONTENTION_MARKER};

/// A scripted failure of one `cat` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Bytes delivered before the read is cut short.
    pub after: u64,
    /// Text written to stderr.
    pub stderr: String,
}

impl Fault {
    /// A read cut short after `after` bytes with the given stderr.
    pub fn new(after: u64, stderr: impl Into<String>) -> Self {
        Self {
            after,
            stderr: stderr.into(),
        }
    }

    /// A read cut short because the repo lock is held elsewhere.
    pub fn lock_contention(after: u64) -> Self {
        Self::new(
            after,
            format!("Error: lock /root/.ipfs/repo.lock: {LOCK_CONTENTION_MARKER}\n"),
        )
    }
}

/// One recorded `cat` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatCall {
    pub offset: u64,
    pub length: u64,
}

/// In-memory store implementation.
///
/// Thread-safe via RwLock. Faults queued with [`push_fault`](Self::push_fault)
/// apply to successive `cat` calls, one each; a sticky fault applies to every
/// call once the queue is empty.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Objects indexed by CID.
    objects: HashMap<ContentId, Bytes>,

    /// One-shot faults for upcoming reads.
    faults: VecDeque<Fault>,

    /// Fault applied when the queue is empty.
    sticky_fault: Option<Fault>,

    /// Probes.
    cat_calls: Vec<CatCall>,
    stat_calls: usize,
    stat_size_calls: usize,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_object(self, cid: ContentId, content: impl Into<Bytes>) -> Self {
        self.insert(cid, content);
        self
    }

    /// Store `content` under `cid`, replacing any previous object.
    pub fn insert(&self, cid: ContentId, content: impl Into<Bytes>) {
        let mut inner = self.inner.write().unwrap();
        inner.objects.insert(cid, content.into());
    }

    /// Remove the object named by `cid`.
    pub fn remove(&self, cid: &ContentId) -> Option<Bytes> {
        let mut inner = self.inner.write().unwrap();
        inner.objects.remove(cid)
    }

    /// Queue a fault for the next `cat` call without one.
    pub fn push_fault(&self, fault: Fault) {
        let mut inner = self.inner.write().unwrap();
        inner.faults.push_back(fault);
    }

    /// Set or clear the fault applied once the queue is exhausted.
    pub fn set_sticky_fault(&self, fault: Option<Fault>) {
        let mut inner = self.inner.write().unwrap();
        inner.sticky_fault = fault;
    }

    /// Every `cat` invocation so far, in order.
    pub fn cat_calls(&self) -> Vec<CatCall> {
        let inner = self.inner.read().unwrap();
        inner.cat_calls.clone()
    }

    /// Number of `stat` invocations so far.
    pub fn stat_calls(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.stat_calls
    }

    /// Number of `stat_size` invocations so far.
    pub fn stat_size_calls(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.stat_size_calls
    }

    /// Number of external invocations of any kind.
    pub fn total_calls(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.cat_calls.len() + inner.stat_calls + inner.stat_size_calls
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(command: String, cid: &ContentId) -> StoreError {
    StoreError::CommandFailed {
        command,
        code: Some(1),
        stderr: format!("Error: {}: file does not exist", cid.ipfs_path()),
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn stat_size(&self, cid: &ContentId) -> Result<u64> {
        let mut inner = self.inner.write().unwrap();
        inner.stat_size_calls += 1;

        match inner.objects.get(cid) {
            Some(content) => Ok(content.len() as u64),
            None => Err(not_found(
                format!("ipfs files stat --format=<size> {}", cid.ipfs_path()),
                cid,
            )),
        }
    }

    async fn stat(&self, cid: &ContentId) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.stat_calls += 1;

        if inner.objects.contains_key(cid) {
            Ok(())
        } else {
            Err(not_found(format!("ipfs files stat {}", cid.ipfs_path()), cid))
        }
    }

    async fn cat(&self, cid: &ContentId, offset: u64, length: u64) -> Result<CatSession> {
        let mut inner = self.inner.write().unwrap();
        inner.cat_calls.push(CatCall { offset, length });

        let fault = inner
            .faults
            .pop_front()
            .or_else(|| inner.sticky_fault.clone());

        let Some(content) = inner.objects.get(cid).cloned() else {
            let stderr = format!("Error: block was not found locally (offline): {cid}\n");
            return Ok(CatSession::new(Cursor::new(Bytes::new()), Diagnostics::fixed(stderr)));
        };

        let len = content.len() as u64;
        let start = offset.min(len);
        let mut end = start.saturating_add(length).min(len);

        let diagnostics = match fault {
            Some(fault) => {
                end = end.min(start.saturating_add(fault.after));
                Diagnostics::fixed(fault.stderr)
            }
            None => Diagnostics::empty(),
        };

        let slice = content.slice(start as usize..end as usize);
        Ok(CatSession::new(Cursor::new(slice), diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn cid() -> ContentId {
        ContentId::parse("bafy123").unwrap()
    }

    fn content() -> Vec<u8> {
        (0..1000u32).map(|i| (i % 251) as u8).collect()
    }

    async fn read_session(mut session: CatSession) -> (Vec<u8>, String) {
        let mut out = Vec::new();
        session.stdout().read_to_end(&mut out).await.unwrap();
        let mut diag = session.release();
        (out, diag.collect(Duration::ZERO).await)
    }

    #[tokio::test]
    async fn test_memory_store_stat() {
        let store = MemoryStore::new().with_object(cid(), content());
        assert_eq!(store.stat_size(&cid()).await.unwrap(), 1000);
        store.stat(&cid()).await.unwrap();

        store.remove(&cid());
        let err = store.stat(&cid()).await.unwrap_err();
        assert!(matches!(err, StoreError::CommandFailed { code: Some(1), .. }));
        assert_eq!(store.stat_calls(), 2);
        assert_eq!(store.stat_size_calls(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_cat_range() {
        let store = MemoryStore::new().with_object(cid(), content());
        let session = store.cat(&cid(), 100, 50).await.unwrap();
        let (out, stderr) = read_session(session).await;
        assert_eq!(out, &content()[100..150]);
        assert!(stderr.is_empty());

        // Length past the end is clamped like the CLI does.
        let session = store.cat(&cid(), 990, 500).await.unwrap();
        let (out, _) = read_session(session).await;
        assert_eq!(out, &content()[990..]);

        assert_eq!(
            store.cat_calls(),
            vec![
                CatCall { offset: 100, length: 50 },
                CatCall { offset: 990, length: 500 },
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_store_faults() {
        let store = MemoryStore::new().with_object(cid(), content());
        store.push_fault(Fault::lock_contention(10));
        store.set_sticky_fault(Some(Fault::new(0, "Error: boom")));

        let (out, stderr) = read_session(store.cat(&cid(), 0, 100).await.unwrap()).await;
        assert_eq!(out, &content()[..10]);
        assert!(stderr.contains(LOCK_CONTENTION_MARKER));

        let (out, stderr) = read_session(store.cat(&cid(), 0, 100).await.unwrap()).await;
        assert!(out.is_empty());
        assert_eq!(stderr, "Error: boom");

        store.set_sticky_fault(None);
        let (out, _) = read_session(store.cat(&cid(), 0, 100).await.unwrap()).await;
        assert_eq!(out, &content()[..100]);
        assert_eq!(store.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_memory_store_unknown_cid_read() {
        let store = MemoryStore::new();
        let (out, stderr) = read_session(store.cat(&cid(), 0, 10).await.unwrap()).await;
        assert!(out.is_empty());
        assert!(stderr.contains("not found"));
    }
}
