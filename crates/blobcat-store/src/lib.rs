//! # blobcat Store
//!
//! The command surface of the content-addressed store blobcat reads from.
//!
//! ## Overview
//!
//! The [`ContentStore`] trait names the three queries blobcat needs: the size
//! of an object, whether it is reachable, and a ranged streaming read. The
//! primary implementation is [`CommandStore`], which runs the store CLI as a
//! subprocess per query; [`MemoryStore`] has the same semantics for tests.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait for store queries
//! - [`CommandStore`] - Subprocess-backed store (`ipfs` CLI by default)
//! - [`MemoryStore`] - Scriptable in-memory store with call probes
//! - [`CatSession`] - One started ranged read: stdout, stderr capture, child
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blobcat_core::ContentId;
//! use blobcat_store::{CommandStore, ContentStore};
//!
//! async fn example() {
//!     let store = CommandStore::default();
//!     let cid = ContentId::parse("bafy123").unwrap();
//!     let size = store.stat_size(&cid).await.unwrap();
//!     println!("{cid} is {size} bytes");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Failures of a read are not errors of `cat`**: they show up as a short
//!   stdout, with the reason in the session's stderr capture.
//! - **No leaked processes**: [`CatSession::release`] drains stdout and reaps
//!   the child on a detached task.

pub mod command;
pub mod error;
pub mod memory;
pub mod session;
pub mod traits;

pub use command::{CommandStore, CommandStoreConfig, REPO_PATH_ENV};
pub use error::{Result, StoreError};
pub use memory::{CatCall, Fault, MemoryStore};
pub use session::{CatReader, CatSession, Diagnostics};
pub use traits::{ContentStore, LOCK_CONTENTION_MARKER};
