//! Warden Executor - the host capability boundary.
//!
//! Everything that touches the real file system or spawns processes goes
//! through the [`HostExecutor`] trait. The safety pipeline and the undo
//! manager only ever hold an `Arc<dyn HostExecutor>`, so tests swap in an
//! in-memory implementation and production uses [`LocalExecutor`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod executor;
mod local;

pub use error::{ExecutorError, ExecutorResult};
pub use executor::{CommandOutput, HostExecutor};
pub use local::{LocalExecutor, LocalExecutorConfig, expand_tilde};
