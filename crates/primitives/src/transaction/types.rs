use std::ops::Range;

use thiserror::Error;

use crate::range::{CharIdx, CharLen, char_len};

/// Represents a single text change reported by the host or issued by the runtime.
///
/// A change describes replacing the text range `[start, end)` with the optional
/// `replacement` text. If `replacement` is [`None`], this represents a deletion.
/// Coordinates always refer to the document before the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The starting character index of the change.
	pub start: CharIdx,
	/// The ending character index of the change (exclusive).
	pub end: CharIdx,
	/// The replacement text, or [`None`] for deletion.
	pub replacement: Option<String>,
}

impl Change {
	/// Creates a change replacing `range` with `text`.
	pub fn replace(range: Range<CharIdx>, text: impl Into<String>) -> Self {
		let text = text.into();
		Self {
			start: range.start,
			end: range.end,
			replacement: (!text.is_empty()).then_some(text),
		}
	}

	/// Creates a pure insertion at `pos`.
	pub fn insert(pos: CharIdx, text: impl Into<String>) -> Self {
		Self::replace(pos..pos, text)
	}

	/// Creates a pure deletion of `range`.
	pub fn delete(range: Range<CharIdx>) -> Self {
		Self {
			start: range.start,
			end: range.end,
			replacement: None,
		}
	}

	/// Returns the replaced range in pre-change coordinates.
	pub fn range(&self) -> Range<CharIdx> {
		self.start..self.end
	}

	/// Returns the inserted text, empty for deletions.
	pub fn text(&self) -> &str {
		self.replacement.as_deref().unwrap_or("")
	}

	/// Returns the number of inserted characters.
	pub fn inserted_len(&self) -> CharLen {
		char_len(self.text())
	}

	/// Returns the number of removed characters.
	pub fn removed_len(&self) -> CharLen {
		self.end.saturating_sub(self.start)
	}
}

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through a change, bias determines whether the position
/// moves with insertions or stays before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// Errors raised while building or applying a change set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
	/// A change ends before it starts.
	#[error("change {start}..{end} is reversed")]
	Reversed { start: CharIdx, end: CharIdx },
	/// Changes are not sorted ascending or overlap each other.
	#[error("change starting at {start} overlaps or precedes the previous change ending at {previous_end}")]
	Unordered { start: CharIdx, previous_end: CharIdx },
	/// A change reaches past the end of the document.
	#[error("change ends at {end} but the document has {len} chars")]
	OutOfBounds { end: CharIdx, len: CharLen },
}

/// A text insertion with cached character length.
///
/// Fields are private to enforce the invariant that `char_len` always equals
/// `text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: String,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: String) -> Self {
		let char_len = char_len(&text);
		Self { text, char_len }
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}

	pub(super) fn push_str(&mut self, other: &Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}
}

/// A single operation within a [`ChangeSet`](super::ChangeSet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	/// Keep N characters from the source.
	Retain(CharLen),
	/// Remove N characters from the source.
	Delete(CharLen),
	/// Insert text at the current position.
	Insert(Insertion),
}
