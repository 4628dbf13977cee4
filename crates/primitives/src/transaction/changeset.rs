use std::ops::Range;

use super::types::{Bias, Change, ChangeError, Insertion, Operation};
use crate::Rope;
use crate::range::{CharIdx, CharLen};

/// A sequence of operations representing a set of changes to a document.
///
/// Changes are stored as retain, delete, and insert operations, which makes
/// mapping positions from the old document into the new one a single linear
/// walk. Trailing text after the last operation is implicitly retained.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	changes: Vec<Operation>,
}

impl ChangeSet {
	/// Builds a changeset from host-style changes.
	///
	/// The changes must be sorted ascending, non-overlapping, and expressed in
	/// pre-change coordinates.
	pub fn from_changes(changes: &[Change]) -> Result<Self, ChangeError> {
		let mut set = Self::default();
		let mut cursor = 0;
		for (i, change) in changes.iter().enumerate() {
			if change.end < change.start {
				return Err(ChangeError::Reversed {
					start: change.start,
					end: change.end,
				});
			}
			if i > 0 && change.start < cursor {
				return Err(ChangeError::Unordered {
					start: change.start,
					previous_end: cursor,
				});
			}
			set.retain(change.start - cursor);
			if let Some(text) = change.replacement.as_ref() {
				set.insert(text.clone());
			}
			set.delete(change.removed_len());
			cursor = change.end;
		}
		Ok(set)
	}

	/// Returns true if this changeset contains no operations.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns a slice of all operations in this changeset.
	pub fn operations(&self) -> &[Operation] {
		&self.changes
	}

	/// Net change in document length produced by this changeset.
	pub fn delta(&self) -> isize {
		self.changes.iter().fold(0isize, |acc, op| match op {
			Operation::Retain(_) => acc,
			Operation::Delete(n) => acc - *n as isize,
			Operation::Insert(ins) => acc + ins.char_len() as isize,
		})
	}

	fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}
		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}
		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Inserts are kept in front of an adjacent delete so that a position at
	/// the start of a replaced region can choose its side via [`Bias`].
	fn insert(&mut self, text: String) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.push_str(&ins);
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	pub fn apply(&self, doc: &mut Rope) -> Result<(), ChangeError> {
		let mut pos = 0;
		let mut old_pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					pos += n;
					old_pos += n;
				}
				Operation::Delete(n) => {
					if pos + n > doc.len_chars() {
						return Err(ChangeError::OutOfBounds {
							end: old_pos + n,
							len: doc.len_chars(),
						});
					}
					doc.remove(pos..pos + n);
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if pos > doc.len_chars() {
						return Err(ChangeError::OutOfBounds {
							end: old_pos,
							len: doc.len_chars(),
						});
					}
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
		Ok(())
	}

	/// Maps a position through this changeset using the specified bias.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;
		// Length of the insertion right before the current deletion.
		let mut inserted = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
					inserted = 0;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						// Inside the replaced region: region start or replacement end.
						return match bias {
							Bias::Left => new_pos - inserted,
							Bias::Right => new_pos,
						};
					}
					old_pos += n;
					inserted = 0;
				}
				Operation::Insert(ins) => {
					if old_pos == pos && bias == Bias::Left {
						// Position is exactly at insert point, stay before
					} else {
						new_pos += ins.char_len();
						inserted = ins.char_len();
					}
				}
			}
		}

		new_pos + (pos - old_pos)
	}

	/// Maps a range, start with [`Bias::Left`] and end with [`Bias::Right`].
	///
	/// Text typed at either edge of the range therefore ends up inside it.
	pub fn map_range(&self, range: &Range<CharIdx>) -> Range<CharIdx> {
		let start = self.map_pos(range.start, Bias::Left);
		let end = self.map_pos(range.end, Bias::Right);
		start..end.max(start)
	}
}
