//! Resolver: descriptor to [`Fetcher`].

use std::sync::Arc;

use blobcat_core::{AnnotationExtractor, CidExtractor, ContentDescriptor};
use blobcat_store::ContentStore;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::fetcher::Fetcher;

/// Turns descriptors into fetchers bound to a content store.
///
/// Resolution is two sequential steps: extract the CID from the descriptor,
/// then ask the store for the object's size. Nothing is cached and nothing is
/// retried.
pub struct Resolver<S, E = AnnotationExtractor> {
    store: Arc<S>,
    extractor: E,
    config: FetchConfig,
}

impl<S: ContentStore + 'static> Resolver<S> {
    /// Create a resolver with the default extractor and configuration.
    pub fn new(store: S) -> Self {
        Self::shared(Arc::new(store))
    }

    /// Create a resolver over a store that is shared with other owners.
    pub fn shared(store: Arc<S>) -> Self {
        Self {
            store,
            extractor: AnnotationExtractor::default(),
            config: FetchConfig::default(),
        }
    }
}

impl<S: ContentStore + 'static, E: CidExtractor> Resolver<S, E> {
    /// Use `config` for every fetcher this resolver produces.
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the CID extractor.
    pub fn with_extractor<X: CidExtractor>(self, extractor: X) -> Resolver<S, X> {
        Resolver {
            store: self.store,
            extractor,
            config: self.config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve `desc` to a fetcher and the object's total size.
    pub async fn resolve(&self, desc: &ContentDescriptor) -> Result<(Fetcher<S>, u64)> {
        let cid = self
            .extractor
            .extract(desc)
            .ok_or_else(|| FetchError::Resolution {
                digest: desc.digest.clone(),
            })?;

        let size = self
            .store
            .stat_size(&cid)
            .await
            .map_err(|source| FetchError::SizeQuery {
                cid: cid.clone(),
                source,
            })?;

        tracing::debug!(%cid, size, digest = %desc.digest, "resolved descriptor");

        let fetcher = Fetcher::new(Arc::clone(&self.store), cid, size, self.config.clone());
        Ok((fetcher, size))
    }
}
