//! Subcommand implementations.

pub(crate) mod check;
pub(crate) mod logs;
pub(crate) mod preview;
pub(crate) mod run;
