//! # blobcat Testkit
//!
//! Testing utilities for blobcat.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known range ids for cross-implementation verification
//! - **Generators**: Proptest strategies for ranges and fault scripts
//! - **Fixtures**: A seeded blob in a [`MemoryStore`](blobcat_store::MemoryStore)
//!   with resolver and fetcher helpers
//! - **Tracing**: Test-writer tracing initialisation
//!
//! ## Golden Vectors
//!
//! ```rust
//! use blobcat_testkit::vectors::{all_vectors, range_id_of};
//!
//! for vector in all_vectors() {
//!     assert_eq!(range_id_of(&vector), vector.range_id);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use blobcat_testkit::generators::RangeParams;
//!
//! proptest! {
//!     #[test]
//!     fn range_is_in_bounds(params: RangeParams) {
//!         prop_assert!(params.offset + params.length <= params.content.len() as u64);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use blobcat_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed(7, 1000);
//! assert_eq!(fixture.expected(0, 10).len(), 10);
//! ```

pub mod fixtures;
pub mod generators;
pub mod tracing_config;
pub mod vectors;

pub use fixtures::{fast_config, read_range, TestFixture};
pub use generators::{range_params, RangeParams};
pub use tracing_config::init_test_tracing;
pub use vectors::{all_vectors, range_id_of, verify_all_vectors, GoldenVector};
