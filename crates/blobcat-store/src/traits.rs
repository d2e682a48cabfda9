//! ContentStore trait: the abstract command surface of the content store.
//!
//! The production implementation shells out to the store CLI
//! ([`CommandStore`](crate::CommandStore)); [`MemoryStore`](crate::MemoryStore)
//! has the same semantics for tests.

use async_trait::async_trait;
use blobcat_core::ContentId;

use crate::error::Result;
use crate::session::CatSession;

/// Substring the store prints on stderr when its repo lock is held by another
/// process.
pub const LOCK_CONTENTION_MARKER: &str = "someone else has the lock";

/// The three queries blobcat issues against the content store.
///
/// # Design Notes
///
/// - `stat_size` and `stat` run to completion and report failure as an error.
/// - `cat` only *starts* a ranged read. A failing read surfaces later, as a
///   short stdout plus diagnostic text in the session's stderr capture.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Total size in bytes of the object named by `cid`.
    async fn stat_size(&self, cid: &ContentId) -> Result<u64>;

    /// Succeeds if the object named by `cid` is currently reachable.
    async fn stat(&self, cid: &ContentId) -> Result<()>;

    /// Start a read of `cid` beginning at `offset`, producing at most
    /// `length` bytes.
    async fn cat(&self, cid: &ContentId, offset: u64, length: u64) -> Result<CatSession>;
}
