//! Warden Storage - namespaced key-value persistence.
//!
//! The [`KvStore`] trait is a byte-level `get`/`set`/`delete` store where
//! every key lives inside a namespace. Two backends ship with the crate:
//!
//! - [`MemoryKvStore`]: process-local, for tests and ephemeral sessions
//! - [`FileKvStore`]: one file per key under a data directory, written
//!   atomically through a temporary file and rename
//!
//! Components never see namespaces directly. They receive a
//! [`ScopedKvStore`] bound to their namespace (the activity logger uses
//! `warden:activity`) and read or write typed values through
//! [`ScopedKvStore::get_json`] / [`ScopedKvStore::set_json`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod file;
pub mod kv;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileKvStore;
pub use kv::{KvStore, ScopedKvStore};
pub use memory::MemoryKvStore;
