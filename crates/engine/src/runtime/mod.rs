//! The snippet runtime: one explicit context owning compiled snippets, the
//! stack of live instances, and the re-entrancy guard.
//!
//! Hosts forward editor events to a [`SnippetEngine`] and receive edits,
//! selections and candidate lists back through their [`EditorHost`]
//! implementation.

mod instance;
mod stack;

use std::ops::Range;

use hypersnip_primitives::{Bias, CharIdx, Change, ChangeSet, DocId};

pub use self::instance::{LivePlaceholder, SnippetInstance};
pub use self::stack::InstanceStack;
use self::instance::Advance;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, SourceError};
use crate::host::{Direction, EditorHost};
use crate::matcher::{AutoExpand, Candidate, MatchInput, MatchResult, find_match};
use crate::registry::{CompiledLanguageSet, DefinitionSource, LoadReport};
use crate::synth::{Expansion, synthesize};

#[cfg(test)]
mod tests;

/// Edits of one document, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
	pub doc: DocId,
	/// Sorted, non-overlapping, in pre-change coordinates.
	pub changes: Vec<Change>,
}

/// What handling a document change did.
#[derive(Debug, Default)]
pub struct ChangeReport {
	/// Placeholders rewritten with recomputed block values.
	pub patched: usize,
	/// Auto-expansion triggered by the change.
	pub expanded: Option<Expansion>,
	/// Failures that did not stop the rest of the handling.
	pub errors: Vec<EngineError>,
}

/// Result of a placeholder navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
	/// A placeholder of a live instance was selected.
	Moved,
	/// No instance was left; the host's own navigation ran.
	Deferred,
}

#[derive(Debug, Default)]
pub struct SnippetEngine {
	config: EngineConfig,
	sets: CompiledLanguageSet,
	stack: InstanceStack,
	inserting: bool,
}

impl SnippetEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// Drops compiled snippets and live instances.
	pub fn reset(&mut self) {
		self.sets = CompiledLanguageSet::default();
		self.stack.clear();
		self.inserting = false;
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn snippets(&self) -> &CompiledLanguageSet {
		&self.sets
	}

	pub fn instances(&self) -> &InstanceStack {
		&self.stack
	}

	/// Whether the engine is inserting an expansion right now.
	pub fn is_inserting(&self) -> bool {
		self.inserting
	}

	/// Replaces the compiled snippets. Live instances are kept.
	pub fn install(&mut self, sets: CompiledLanguageSet) {
		self.sets = sets;
	}

	/// Compiles every scope of `source` and installs the result.
	///
	/// Scopes that fail to compile are reported and left out.
	pub fn load(&mut self, source: &dyn DefinitionSource) -> std::result::Result<LoadReport, SourceError> {
		let (sets, report) = CompiledLanguageSet::load(source, &self.config.priority)?;
		tracing::info!(
			scopes = report.loaded.len(),
			snippets = report.snippet_count(),
			failed = report.failed.len(),
			"loaded snippet definitions"
		);
		self.install(sets);
		Ok(report)
	}

	/// Recompiles everything after a definition file was saved.
	pub fn on_definition_saved(&mut self, source: &dyn DefinitionSource) -> std::result::Result<LoadReport, SourceError> {
		tracing::debug!("definition source saved, reloading");
		self.load(source)
	}

	/// Handles edits of one document.
	///
	/// Live instances are remapped first, then block values depending on an
	/// edited placeholder of the top instance are recomputed and patched.
	/// Only then is the edit checked for a trigger.
	pub fn on_document_changed(&mut self, host: &mut dyn EditorHost, change: DocumentChange) -> Result<ChangeReport> {
		let DocumentChange { doc, changes } = change;
		let mut report = ChangeReport::default();
		if changes.is_empty() {
			return Ok(report);
		}
		let set = ChangeSet::from_changes(&changes)?;

		let edited = self.stack.top().filter(|top| top.doc() == doc).and_then(|top| {
			let idx = changes.iter().find_map(|c| top.placeholder_for(&c.range()))?;
			Some((idx, top.placeholders()[idx].block))
		});
		self.stack.remap(doc, &set, edited.map(|(idx, _)| idx));

		let first = &changes[0];
		let mut cursor = set.map_pos(first.start, Bias::Left) + first.inserted_len();

		if let Some((_, Some(block))) = edited {
			match self.propagate(host, doc, block, &mut cursor, &mut report.errors) {
				Ok(patched) => report.patched = patched,
				Err(error) => {
					tracing::warn!(%doc, block, %error, "dependent placeholder update failed");
					report.errors.push(error);
				}
			}
		}

		if self.inserting || !self.is_keystroke(first) || !host.is_active(doc) {
			return Ok(report);
		}
		match self.match_at(&*host, doc, cursor) {
			Ok(MatchResult::AutoExpand(matched)) => match self.expand(host, doc, matched) {
				Ok(expansion) => report.expanded = Some(expansion),
				Err(error) => {
					tracing::warn!(%doc, %error, "auto-expansion failed");
					report.errors.push(error);
				}
			},
			Ok(MatchResult::Candidates(_)) => {}
			Err(error) => report.errors.push(error),
		}
		Ok(report)
	}

	fn is_keystroke(&self, change: &Change) -> bool {
		if self.config.keystroke_only { change.inserted_len() == 1 } else { change.inserted_len() > 0 }
	}

	/// Re-runs the top instance's generator with the live texts of blocks
	/// `0..=block` and patches every later placeholder whose value changed.
	///
	/// Patches go last to first; `cursor` is kept in step with them. Blocks
	/// that fail keep their text and land in `errors`.
	fn propagate(
		&mut self,
		host: &mut dyn EditorHost,
		doc: DocId,
		block: usize,
		cursor: &mut CharIdx,
		errors: &mut Vec<EngineError>,
	) -> Result<usize> {
		let Some(top) = self.stack.top() else {
			return Ok(0);
		};
		let mut live = Vec::with_capacity(block + 1);
		for idx in 0..=block {
			let text = match top.placeholder_of_block(idx) {
				Some(placeholder) => host.text(doc, placeholder.range.clone())?,
				None => top.values().get(idx).cloned().unwrap_or_default(),
			};
			live.push(text);
		}
		let rerun = top.snippet().generator.rerun(top.captures(), &live, top.values(), &self.config.script)?;
		let failed: Vec<usize> = rerun.failures.iter().map(|(idx, _)| *idx).collect();
		for (idx, error) in rerun.failures {
			tracing::warn!(%doc, block = idx, %error, "dependent block failed, keeping its text");
			errors.push(error.into());
		}
		let output = rerun.output;

		let mut patches: Vec<(usize, Range<CharIdx>, String)> = Vec::new();
		for (idx, placeholder) in top.placeholders().iter().enumerate() {
			let Some(b) = placeholder.block.filter(|b| *b > block && !failed.contains(b)) else {
				continue;
			};
			let value = output.block_values.get(b).cloned().unwrap_or_default();
			if host.text(doc, placeholder.range.clone())? != value {
				patches.push((idx, placeholder.range.clone(), value));
			}
		}
		patches.sort_by_key(|(_, range, _)| std::cmp::Reverse(range.start));

		let patched = patches.len();
		for (idx, range, value) in patches {
			host.replace_range(doc, range.clone(), &value)?;
			let set = ChangeSet::from_changes(&[Change::replace(range, value)])?;
			self.stack.remap(doc, &set, Some(idx));
			*cursor = set.map_pos(*cursor, Bias::Left);
		}
		if let Some(top) = self.stack.top_mut() {
			top.set_values(output.block_values);
		}
		tracing::debug!(%doc, block, patched, "updated dependent placeholders");
		Ok(patched)
	}

	fn match_at(&self, host: &dyn EditorHost, doc: DocId, pos: CharIdx) -> Result<MatchResult> {
		let language = host.language_id(doc)?;
		let prefix = host.text_before(doc, pos, self.config.context_chars)?;
		let input = MatchInput { prefix: &prefix, cursor: pos };
		Ok(find_match(self.sets.lookup(&language), &input, || host.is_math_context(doc, pos)))
	}

	/// Replaces the matched trigger with the snippet's expansion.
	///
	/// The generator runs before the document is touched, so a failing block
	/// leaves the document unchanged.
	pub fn expand(&mut self, host: &mut dyn EditorHost, doc: DocId, matched: AutoExpand) -> Result<Expansion> {
		let AutoExpand { range, snippet, captures } = matched;
		let expansion = synthesize(&snippet, captures, range.clone(), &self.config.script)?;

		self.inserting = true;
		let inserted = insert(host, doc, &expansion);
		self.inserting = false;
		inserted?;

		let favored = self.stack.top().filter(|top| top.doc() == doc).and_then(|top| top.placeholder_for(&range));
		let set = ChangeSet::from_changes(&[Change::replace(range, expansion.text.clone())])?;
		self.stack.remap(doc, &set, favored);

		let start = expansion.replace.start;
		match SnippetInstance::from_expansion(doc, &expansion) {
			Some(instance) => {
				let selection = instance.active().map(|p| p.range.clone());
				self.stack.push(instance);
				if let Some(selection) = selection {
					host.select(doc, selection)?;
				}
			}
			None => {
				let end = start + hypersnip_primitives::range::char_len(&expansion.text);
				host.select(doc, end..end)?;
			}
		}
		tracing::debug!(
			%doc,
			snippet = expansion.snippet.label(),
			placeholders = expansion.placeholders.len(),
			depth = self.stack.len(),
			"expanded snippet"
		);
		Ok(expansion)
	}

	/// Snippets that could complete the word before `pos`.
	///
	/// Empty when the text already ends in a full trigger.
	pub fn complete(&self, host: &dyn EditorHost, doc: DocId, pos: CharIdx) -> Result<Vec<Candidate>> {
		Ok(match self.match_at(host, doc, pos)? {
			MatchResult::AutoExpand(_) => Vec::new(),
			MatchResult::Candidates(candidates) => candidates,
		})
	}

	/// Expands a full trigger before `pos`, or lets the host pick one of the
	/// completion candidates and expands that.
	pub fn request_completion(&mut self, host: &mut dyn EditorHost, doc: DocId, pos: CharIdx) -> Result<Option<Expansion>> {
		let matched = match self.match_at(&*host, doc, pos)? {
			MatchResult::AutoExpand(matched) => matched,
			MatchResult::Candidates(candidates) => {
				let Some(choice) = host.present_candidates(&candidates).and_then(|idx| candidates.into_iter().nth(idx)) else {
					return Ok(None);
				};
				let trigger = choice.snippet.trigger.as_str().to_owned();
				AutoExpand {
					range: choice.range,
					snippet: choice.snippet,
					captures: vec![Some(trigger)],
				}
			}
		};
		self.expand(host, doc, matched).map(Some)
	}

	pub fn next_placeholder(&mut self, host: &mut dyn EditorHost) -> Result<NavOutcome> {
		self.navigate(host, Direction::Forward)
	}

	pub fn prev_placeholder(&mut self, host: &mut dyn EditorHost) -> Result<NavOutcome> {
		self.navigate(host, Direction::Backward)
	}

	/// Moves within the top instance; exhausted instances are popped and the
	/// command passes on to the next one, then to the host.
	fn navigate(&mut self, host: &mut dyn EditorHost, direction: Direction) -> Result<NavOutcome> {
		while let Some(top) = self.stack.top_mut() {
			match top.advance(direction) {
				Advance::Moved => {
					let doc = top.doc();
					let Some(range) = top.active().map(|p| p.range.clone()) else {
						self.stack.pop();
						continue;
					};
					tracing::debug!(%doc, ?direction, ?range, "moved to placeholder");
					host.select(doc, range)?;
					return Ok(NavOutcome::Moved);
				}
				Advance::End => {
					tracing::debug!(?direction, "snippet instance exhausted");
					self.stack.pop();
				}
			}
		}
		host.navigate_native(direction);
		Ok(NavOutcome::Deferred)
	}

	/// Drops every live instance and leaves the host's snippet mode.
	pub fn leave_snippet(&mut self, host: &mut dyn EditorHost) {
		self.stack.clear();
		host.leave_native();
	}

	/// Pops instances until the top one contains a selection of `doc`.
	///
	/// Returns how many instances were popped.
	pub fn on_selection_changed(&mut self, doc: DocId, selections: &[Range<CharIdx>]) -> usize {
		let mut popped = 0;
		while let Some(top) = self.stack.top() {
			if top.doc() == doc && selections.iter().any(|s| top.contains(s)) {
				break;
			}
			self.stack.pop();
			popped += 1;
		}
		if popped > 0 {
			tracing::debug!(%doc, popped, remaining = self.stack.len(), "selection left snippet instances");
		}
		popped
	}

	/// The editor view went away; every instance is dropped.
	pub fn on_visibility_changed(&mut self) {
		if !self.stack.is_empty() {
			tracing::debug!(dropped = self.stack.len(), "editor hidden, clearing snippet instances");
		}
		self.stack.clear();
	}
}

fn insert(host: &mut dyn EditorHost, doc: DocId, expansion: &Expansion) -> Result<()> {
	host.replace_range(doc, expansion.replace.clone(), "")?;
	host.insert_template(doc, expansion.replace.start, &expansion.template)?;
	Ok(())
}
