//! Core types shared by the snippet compiler and runtime: char ranges,
//! document identities, and text changes with position mapping.

/// Identifier types for documents.
pub mod ids;
/// Char-indexed range helpers.
pub mod range;
/// Text changes and position mapping.
pub mod transaction;

pub use ids::DocId;
pub use range::{CharIdx, CharLen};
pub use ropey::{Rope, RopeSlice};
pub use transaction::{Bias, Change, ChangeError, ChangeSet, apply_changes};
