//! An in-memory [`EditorHost`] for tests and examples.

use std::collections::BTreeMap;
use std::ops::Range;

use hypersnip_primitives::{CharIdx, Change, DocId, Rope, apply_changes};

use crate::error::HostError;
use crate::host::{Direction, EditorHost};
use crate::matcher::Candidate;
use crate::runtime::DocumentChange;
use crate::synth::render_template;

#[derive(Debug, Clone)]
struct Document {
	text: Rope,
	language: String,
}

/// Documents held as ropes, with every call the engine makes recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
	docs: BTreeMap<DocId, Document>,
	active: Option<DocId>,
	next_id: u64,
	/// Answer of [`EditorHost::is_math_context`].
	pub math: bool,
	/// Index returned by [`EditorHost::present_candidates`].
	pub choice: Option<usize>,
	/// Every selection made through [`EditorHost::select`].
	pub selections: Vec<(DocId, Range<CharIdx>)>,
	/// Native navigation requests, in order.
	pub native_moves: Vec<Direction>,
	pub native_leaves: usize,
	/// Templates passed to [`EditorHost::insert_template`].
	pub templates: Vec<String>,
	/// Labels of every candidate list shown.
	pub presented: Vec<Vec<String>>,
	/// Makes [`EditorHost::insert_template`] fail.
	pub fail_insert: bool,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens a document and makes it the active one.
	pub fn open(&mut self, language: &str, text: &str) -> DocId {
		let doc = DocId(self.next_id);
		self.next_id += 1;
		self.docs.insert(
			doc,
			Document {
				text: Rope::from_str(text),
				language: language.to_owned(),
			},
		);
		self.active = Some(doc);
		doc
	}

	pub fn activate(&mut self, doc: DocId) {
		self.active = Some(doc);
	}

	pub fn text_of(&self, doc: DocId) -> String {
		self.docs.get(&doc).map(|d| d.text.to_string()).unwrap_or_default()
	}

	pub fn last_selection(&self) -> Option<Range<CharIdx>> {
		self.selections.last().map(|(_, range)| range.clone())
	}

	/// Applies a user edit and returns the event to forward to the engine.
	pub fn edit(&mut self, doc: DocId, changes: Vec<Change>) -> Result<DocumentChange, HostError> {
		let document = self.docs.get_mut(&doc).ok_or(HostError::UnknownDocument(doc))?;
		apply_changes(&mut document.text, &changes).map_err(|e| HostError::Other(e.to_string()))?;
		Ok(DocumentChange { doc, changes })
	}

	/// Types `text` at `pos` as a single insertion.
	pub fn type_text(&mut self, doc: DocId, pos: CharIdx, text: &str) -> Result<DocumentChange, HostError> {
		self.edit(doc, vec![Change::insert(pos, text)])
	}

	fn document(&self, doc: DocId) -> Result<&Document, HostError> {
		self.docs.get(&doc).ok_or(HostError::UnknownDocument(doc))
	}

	fn checked(&self, doc: DocId, range: &Range<CharIdx>) -> Result<(), HostError> {
		let len = self.document(doc)?.text.len_chars();
		if range.start > range.end || range.end > len {
			return Err(HostError::OutOfBounds {
				doc,
				start: range.start,
				end: range.end,
				len,
			});
		}
		Ok(())
	}
}

impl EditorHost for MemoryHost {
	fn language_id(&self, doc: DocId) -> Result<String, HostError> {
		Ok(self.document(doc)?.language.clone())
	}

	fn text(&self, doc: DocId, range: Range<CharIdx>) -> Result<String, HostError> {
		self.checked(doc, &range)?;
		Ok(self.document(doc)?.text.slice(range).to_string())
	}

	fn is_math_context(&self, _doc: DocId, _pos: CharIdx) -> bool {
		self.math
	}

	fn is_active(&self, doc: DocId) -> bool {
		self.active == Some(doc)
	}

	fn replace_range(&mut self, doc: DocId, range: Range<CharIdx>, text: &str) -> Result<(), HostError> {
		self.checked(doc, &range)?;
		let document = self.docs.get_mut(&doc).ok_or(HostError::UnknownDocument(doc))?;
		document.text.remove(range.clone());
		document.text.insert(range.start, text);
		Ok(())
	}

	fn insert_template(&mut self, doc: DocId, pos: CharIdx, template: &str) -> Result<(), HostError> {
		if self.fail_insert {
			return Err(HostError::Other("template insertion refused".into()));
		}
		self.templates.push(template.to_owned());
		self.replace_range(doc, pos..pos, &render_template(template))
	}

	fn select(&mut self, doc: DocId, range: Range<CharIdx>) -> Result<(), HostError> {
		self.checked(doc, &range)?;
		self.selections.push((doc, range));
		Ok(())
	}

	fn navigate_native(&mut self, direction: Direction) {
		self.native_moves.push(direction);
	}

	fn leave_native(&mut self) {
		self.native_leaves += 1;
	}

	fn present_candidates(&mut self, candidates: &[Candidate]) -> Option<usize> {
		self.presented.push(candidates.iter().map(|c| c.snippet.label().to_owned()).collect());
		self.choice.filter(|idx| *idx < candidates.len())
	}
}
