//! CID extraction: descriptor to content identifier.

use crate::descriptor::ContentDescriptor;
use crate::types::ContentId;

/// Annotation key carrying the CID of a layer stored in IPFS.
pub const CID_ANNOTATION: &str = "containerd.io/snapshot/remote/ipfs/cid";

/// URL scheme prefix for descriptors that record their CID as a location.
pub const IPFS_URL_SCHEME: &str = "ipfs://";

/// Looks up the content identifier a descriptor refers to.
///
/// Returns `None` when the descriptor carries no usable identifier.
pub trait CidExtractor: Send + Sync {
    fn extract(&self, desc: &ContentDescriptor) -> Option<ContentId>;
}

/// Extracts the CID from an annotation, falling back to `ipfs://` URLs.
#[derive(Debug, Clone)]
pub struct AnnotationExtractor {
    key: String,
}

impl AnnotationExtractor {
    /// Extractor reading the given annotation key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The annotation key consulted first.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for AnnotationExtractor {
    fn default() -> Self {
        Self::new(CID_ANNOTATION)
    }
}

impl CidExtractor for AnnotationExtractor {
    fn extract(&self, desc: &ContentDescriptor) -> Option<ContentId> {
        if let Some(cid) = desc
            .annotations
            .get(&self.key)
            .and_then(|value| ContentId::parse(value.trim()).ok())
        {
            return Some(cid);
        }

        desc.urls
            .iter()
            .filter_map(|url| url.strip_prefix(IPFS_URL_SCHEME))
            .find_map(|rest| ContentId::parse(rest).ok())
    }
}

impl<F> CidExtractor for F
where
    F: Fn(&ContentDescriptor) -> Option<ContentId> + Send + Sync,
{
    fn extract(&self, desc: &ContentDescriptor) -> Option<ContentId> {
        self(desc)
    }
}
