//! The editor seam.
//!
//! The engine never touches a document directly. Everything it needs to
//! read or change goes through an [`EditorHost`], which is also where the
//! math-context heuristic and the candidate picker live.

use std::ops::Range;

use hypersnip_primitives::{CharIdx, DocId};

use crate::error::HostError;
use crate::matcher::Candidate;

/// Placeholder navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Forward,
	Backward,
}

/// Services the engine consumes from the editor.
pub trait EditorHost {
	/// Language identifier of `doc`, used to pick a snippet list.
	fn language_id(&self, doc: DocId) -> Result<String, HostError>;

	/// Text of `range` in `doc`.
	fn text(&self, doc: DocId, range: Range<CharIdx>) -> Result<String, HostError>;

	/// Up to `max_chars` chars ending at `pos`.
	fn text_before(&self, doc: DocId, pos: CharIdx, max_chars: usize) -> Result<String, HostError> {
		self.text(doc, pos.saturating_sub(max_chars)..pos)
	}

	/// Whether `pos` sits inside math notation.
	fn is_math_context(&self, doc: DocId, pos: CharIdx) -> bool;

	/// Whether `doc` is the document currently being edited.
	fn is_active(&self, doc: DocId) -> bool;

	/// Replaces `range` with plain `text`.
	fn replace_range(&mut self, doc: DocId, range: Range<CharIdx>, text: &str) -> Result<(), HostError>;

	/// Inserts snippet syntax at `pos`.
	fn insert_template(&mut self, doc: DocId, pos: CharIdx, template: &str) -> Result<(), HostError>;

	/// Selects `range`.
	fn select(&mut self, doc: DocId, range: Range<CharIdx>) -> Result<(), HostError>;

	/// Runs the editor's own tabstop navigation.
	fn navigate_native(&mut self, direction: Direction);

	/// Leaves the editor's own snippet mode.
	fn leave_native(&mut self);

	/// Shows `candidates` and returns the index of the chosen one.
	fn present_candidates(&mut self, candidates: &[Candidate]) -> Option<usize>;
}
