//! # blobcat Core
//!
//! Pure primitives for blobcat: content identifiers, descriptors, and the
//! deterministic range identifiers handed to consumers as cache keys.
//!
//! This crate contains no I/O, no subprocesses, no async. Everything here is
//! a pure function of its inputs.
//!
//! ## Key Types
//!
//! - [`ContentId`] - Validated CID naming an object in the content store
//! - [`ContentDescriptor`] - OCI-style descriptor the CID is extracted from
//! - [`RangeId`] - SHA-256 identifier of a `(cid, offset, length)` sub-range
//! - [`CidExtractor`] - Descriptor to CID lookup, with [`AnnotationExtractor`]
//!   as the default

pub mod descriptor;
pub mod error;
pub mod extract;
pub mod types;

pub use descriptor::ContentDescriptor;
pub use error::{CoreError, Result};
pub use extract::{AnnotationExtractor, CidExtractor, CID_ANNOTATION, IPFS_URL_SCHEME};
pub use types::{ContentId, RangeId};
