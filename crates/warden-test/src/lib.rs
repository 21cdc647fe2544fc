//! Warden Test - shared test utilities for the Warden crates.
//!
//! Provides an in-memory [`HostExecutor`](warden_executor::HostExecutor)
//! with scripted failures and a call log, plus fixtures and harness helpers.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! warden-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use warden_test::{MockExecutor, FailOn};
//!
//! #[tokio::test]
//! async fn test_undo_restores_file() {
//!     let executor = MockExecutor::new().with_file("/tmp/a.txt", "old");
//!     executor.fail_next(FailOn::Write);
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
