use std::ops::Range;
use std::sync::Arc;

use hypersnip_primitives::range::{self, char_len};
use hypersnip_primitives::{Bias, CharIdx, ChangeSet, DocId};

use crate::host::Direction;
use crate::snippet::SnippetDefinition;
use crate::synth::{EXIT_PLACEHOLDER, Expansion};

/// A placeholder of a live instance, in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePlaceholder {
	pub number: u32,
	pub block: Option<usize>,
	pub range: Range<CharIdx>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
	Moved,
	End,
}

/// One in-progress expansion.
#[derive(Debug, Clone)]
pub struct SnippetInstance {
	doc: DocId,
	snippet: Arc<SnippetDefinition>,
	captures: Vec<Option<String>>,
	range: Range<CharIdx>,
	/// In text order.
	placeholders: Vec<LivePlaceholder>,
	/// Placeholder indices in navigation order, the exit stop last.
	order: Vec<usize>,
	active_i: usize,
	/// Last computed value of each block.
	values: Vec<String>,
}

impl SnippetInstance {
	/// Tracks `expansion` after it was inserted at its replace start.
	///
	/// Returns `None` for expansions that need no tracking.
	pub(crate) fn from_expansion(doc: DocId, expansion: &Expansion) -> Option<Self> {
		if !expansion.is_tracked() {
			return None;
		}
		let base = expansion.replace.start;
		let placeholders: Vec<LivePlaceholder> = expansion
			.placeholders
			.iter()
			.map(|p| LivePlaceholder {
				number: p.number,
				block: p.block,
				range: range::offset(&p.span, base),
			})
			.collect();
		let order = placeholder_order(&placeholders);
		let active_i = order.iter().position(|&idx| placeholders[idx].number == expansion.first_placeholder).unwrap_or(0);

		Some(Self {
			doc,
			snippet: Arc::clone(&expansion.snippet),
			captures: expansion.captures.clone(),
			range: base..base + char_len(&expansion.text),
			placeholders,
			order,
			active_i,
			values: expansion.block_values.clone(),
		})
	}

	pub fn doc(&self) -> DocId {
		self.doc
	}

	pub fn snippet(&self) -> &Arc<SnippetDefinition> {
		&self.snippet
	}

	pub(crate) fn captures(&self) -> &[Option<String>] {
		&self.captures
	}

	/// Document range covered by the expansion.
	pub fn range(&self) -> Range<CharIdx> {
		self.range.clone()
	}

	pub fn placeholders(&self) -> &[LivePlaceholder] {
		&self.placeholders
	}

	pub fn values(&self) -> &[String] {
		&self.values
	}

	pub(crate) fn set_values(&mut self, values: Vec<String>) {
		self.values = values;
	}

	pub fn active(&self) -> Option<&LivePlaceholder> {
		self.order.get(self.active_i).map(|&idx| &self.placeholders[idx])
	}

	/// The placeholder computed by `block`.
	pub fn placeholder_of_block(&self, block: usize) -> Option<&LivePlaceholder> {
		self.placeholders.iter().find(|p| p.block == Some(block))
	}

	pub(crate) fn advance(&mut self, direction: Direction) -> Advance {
		match direction {
			Direction::Forward if self.active_i + 1 < self.order.len() => {
				self.active_i += 1;
				Advance::Moved
			}
			Direction::Backward if self.active_i > 0 => {
				self.active_i -= 1;
				Advance::Moved
			}
			_ => Advance::End,
		}
	}

	/// Whether `selection` lies within the instance, edges included.
	pub fn contains(&self, selection: &Range<CharIdx>) -> bool {
		range::contains(&self.range, selection)
	}

	/// Index of the placeholder an edit of `edited` falls into.
	///
	/// Adjacent placeholders share a boundary; the active one wins.
	pub(crate) fn placeholder_for(&self, edited: &Range<CharIdx>) -> Option<usize> {
		let hits = |idx: &usize| range::contains(&self.placeholders[*idx].range, edited);
		let active = self.order.get(self.active_i).copied().filter(hits);
		active.or_else(|| (0..self.placeholders.len()).find(hits))
	}

	/// Maps every range through `changes`.
	///
	/// The `favored` placeholder absorbs text inserted at its edges; the other
	/// placeholders then keep their own edges out of it.
	pub(crate) fn remap(&mut self, changes: &ChangeSet, favored: Option<usize>) {
		self.range = changes.map_range(&self.range);
		for (idx, placeholder) in self.placeholders.iter_mut().enumerate() {
			placeholder.range = match favored {
				Some(f) if f != idx => {
					let start = changes.map_pos(placeholder.range.start, Bias::Right);
					let end = changes.map_pos(placeholder.range.end, Bias::Left);
					start..end.max(start)
				}
				_ => changes.map_range(&placeholder.range),
			};
		}
	}
}

/// Ascending placeholder numbers with the exit stop last.
fn placeholder_order(placeholders: &[LivePlaceholder]) -> Vec<usize> {
	let mut order: Vec<usize> = (0..placeholders.len()).collect();
	order.sort_by_key(|&idx| {
		let number = placeholders[idx].number;
		(number == EXIT_PLACEHOLDER, number)
	});
	order
}
