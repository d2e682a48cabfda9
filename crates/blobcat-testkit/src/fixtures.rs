//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use blobcat::{FetchConfig, Fetcher, RangeReader, Resolver};
use blobcat_core::{ContentDescriptor, ContentId, CID_ANNOTATION};
use blobcat_store::MemoryStore;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::io::AsyncReadExt;

/// Fetch configuration without retry pauses, for tests.
pub fn fast_config() -> FetchConfig {
    FetchConfig {
        retry_backoff: Duration::ZERO,
        chunk_size: 4096,
        ..FetchConfig::default()
    }
}

/// Read a range to the end.
pub async fn read_range(mut reader: RangeReader) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(out)
}

/// A test fixture with one blob stored in a memory store.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub cid: ContentId,
    pub content: Bytes,
}

impl TestFixture {
    /// Store `content` under `cid`.
    pub fn new(cid: &str, content: impl Into<Bytes>) -> Self {
        let cid = ContentId::parse(cid).expect("fixture cid must be valid");
        let content = content.into();
        let store = Arc::new(MemoryStore::new().with_object(cid.clone(), content.clone()));
        Self {
            store,
            cid,
            content,
        }
    }

    /// A blob of `size` pseudo-random bytes determined by `seed`.
    pub fn with_seed(seed: u64, size: usize) -> Self {
        let mut content = vec![0u8; size];
        StdRng::seed_from_u64(seed).fill_bytes(&mut content);
        Self::new(&format!("bafyfixture{seed}"), content)
    }

    /// A descriptor carrying the fixture's CID as an annotation.
    pub fn descriptor(&self) -> ContentDescriptor {
        ContentDescriptor::new(
            "application/octet-stream",
            format!("sha256:fixture-{}", self.cid),
            self.content.len() as u64,
        )
        .annotation(CID_ANNOTATION, self.cid.as_str())
    }

    /// A resolver over the fixture store using [`fast_config`].
    pub fn resolver(&self) -> Resolver<MemoryStore> {
        Resolver::shared(Arc::clone(&self.store)).with_config(fast_config())
    }

    /// A fetcher for the fixture blob, bypassing resolution.
    pub fn fetcher(&self, config: FetchConfig) -> Fetcher<MemoryStore> {
        Fetcher::new(
            Arc::clone(&self.store),
            self.cid.clone(),
            self.content.len() as u64,
            config,
        )
    }

    /// The bytes a fetch of `[offset, offset+length)` must produce.
    pub fn expected(&self, offset: u64, length: u64) -> &[u8] {
        let start = offset as usize;
        &self.content[start..start + length as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_fixture_is_deterministic() {
        let a = TestFixture::with_seed(42, 256);
        let b = TestFixture::with_seed(42, 256);
        assert_eq!(a.content, b.content);
        assert_eq!(a.cid, b.cid);
        assert_ne!(a.content, TestFixture::with_seed(43, 256).content);
    }

    #[test]
    fn test_descriptor_resolves_to_fixture_cid() {
        use blobcat_core::{AnnotationExtractor, CidExtractor};

        let fixture = TestFixture::with_seed(1, 16);
        let cid = AnnotationExtractor::default()
            .extract(&fixture.descriptor())
            .unwrap();
        assert_eq!(cid, fixture.cid);
    }
}
