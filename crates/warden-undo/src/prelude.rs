//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_undo::prelude::*;` to import all essential types.

pub use crate::{UndoError, UndoManager, UndoOutcome, UndoRecord, UndoResult, UndoableOperation};
