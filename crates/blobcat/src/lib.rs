//! # blobcat
//!
//! Range reads of content-addressed blobs served by a local store daemon,
//! for lazy, on-demand filesystem layers.
//!
//! ## Overview
//!
//! - **Resolve**: a [`Resolver`] extracts the CID from a descriptor and asks
//!   the store for the object's size, producing a [`Fetcher`].
//! - **Fetch**: [`Fetcher::fetch`] returns a [`RangeReader`] at once and
//!   streams exactly `[offset, offset+length)` from a background task.
//! - **Resume**: when the store's repo lock is held by another process the
//!   read is cut short; the task waits and resumes from the first byte not
//!   yet delivered, up to 100 times.
//! - **Check / DeriveID**: liveness of a resolved CID, and a SHA-256 range id
//!   usable as a cache key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blobcat::{Resolver, ContentDescriptor, CID_ANNOTATION};
//! use blobcat::store::CommandStore;
//! use tokio::io::AsyncReadExt;
//!
//! async fn example() {
//!     let resolver = Resolver::new(CommandStore::default());
//!
//!     let desc = ContentDescriptor::new("application/octet-stream", "sha256:...", 1000)
//!         .annotation(CID_ANNOTATION, "bafy123");
//!     let (fetcher, size) = resolver.resolve(&desc).await.unwrap();
//!
//!     let mut reader = fetcher.fetch(0, size.min(500)).unwrap();
//!     let mut buf = Vec::new();
//!     reader.read_to_end(&mut buf).await.unwrap();
//!
//!     let key = fetcher.derive_id(0, size.min(500));
//!     println!("{key}: {} bytes", buf.len());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `blobcat::core` - Content identifiers, descriptors, range ids
//! - `blobcat::store` - The store command surface and its backends

pub mod config;
pub mod error;
pub mod fetcher;
pub mod resolver;
mod transfer;

// Re-export component crates
pub use blobcat_core as core;
pub use blobcat_store as store;

// Re-export main types for convenience
pub use config::FetchConfig;
pub use error::{FetchError, Result};
pub use fetcher::{Fetcher, RangeReader};
pub use resolver::Resolver;

// Re-export commonly used core types
pub use blobcat_core::{
    AnnotationExtractor, CidExtractor, ContentDescriptor, ContentId, RangeId, CID_ANNOTATION,
};
