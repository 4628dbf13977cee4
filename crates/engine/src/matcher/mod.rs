//! Trigger matching and completion candidates.
//!
//! The matcher walks a priority-sorted snippet list once. The first snippet
//! whose trigger fully matches the text before the cursor wins outright;
//! otherwise literal triggers that extend the word being typed are collected
//! as candidates.

use std::ops::Range;
use std::sync::Arc;

use hypersnip_primitives::CharIdx;
use hypersnip_primitives::range::char_len;

use crate::snippet::{SnippetDefinition, SnippetFlags, Trigger};

#[cfg(test)]
mod tests;

/// Text before the cursor and the cursor's document position.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
	/// Document text ending at the cursor. May be truncated at the front.
	pub prefix: &'a str,
	pub cursor: CharIdx,
}

/// A unique, full trigger match.
#[derive(Debug, Clone)]
pub struct AutoExpand {
	/// Document range holding the typed trigger.
	pub range: Range<CharIdx>,
	pub snippet: Arc<SnippetDefinition>,
	/// Match context bound to `m`: the whole match, then each group.
	pub captures: Vec<Option<String>>,
}

/// A snippet offered for interactive selection.
#[derive(Debug, Clone)]
pub struct Candidate {
	/// Document range of the partially typed trigger.
	pub range: Range<CharIdx>,
	pub snippet: Arc<SnippetDefinition>,
}

#[derive(Debug, Clone)]
pub enum MatchResult {
	AutoExpand(AutoExpand),
	/// Possibly empty, in priority order.
	Candidates(Vec<Candidate>),
}

impl MatchResult {
	pub fn auto_expand(self) -> Option<AutoExpand> {
		match self {
			Self::AutoExpand(matched) => Some(matched),
			Self::Candidates(_) => None,
		}
	}
}

/// Identifier-class characters for the word-boundary rule.
pub fn is_word_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_'
}

/// Matches `snippets` (sorted by descending priority) against `input`.
///
/// `is_math` is only consulted when a math-gated snippet is reached, and at
/// most once.
pub fn find_match(snippets: &[Arc<SnippetDefinition>], input: &MatchInput<'_>, is_math: impl FnMut() -> bool) -> MatchResult {
	let mut math = MathGate::new(is_math);
	let word = trailing_word(input.prefix);
	let mut candidates = Vec::new();

	for snippet in snippets {
		if snippet.is_math() && !math.allows() {
			continue;
		}
		match &snippet.trigger {
			Trigger::Anonymous => {}
			Trigger::Literal(trigger) => {
				if let Some(range) = match_literal(trigger, snippet.flags, input) {
					return MatchResult::AutoExpand(AutoExpand {
						range,
						snippet: Arc::clone(snippet),
						captures: vec![Some(trigger.clone())],
					});
				}
				if !word.is_empty() && trigger.len() > word.len() && trigger.starts_with(word) {
					let start = input.cursor.saturating_sub(char_len(word));
					candidates.push(Candidate {
						range: start..input.cursor,
						snippet: Arc::clone(snippet),
					});
				}
			}
			Trigger::Pattern(regex) => {
				if let Some((range, captures)) = match_pattern(regex, snippet.flags, input) {
					return MatchResult::AutoExpand(AutoExpand {
						range,
						snippet: Arc::clone(snippet),
						captures,
					});
				}
			}
		}
	}

	MatchResult::Candidates(candidates)
}

fn match_literal(trigger: &str, flags: SnippetFlags, input: &MatchInput<'_>) -> Option<Range<CharIdx>> {
	let before = input.prefix.strip_suffix(trigger)?;
	if !flags.contains(SnippetFlags::IN_WORD) && before.chars().next_back().is_some_and(is_word_char) {
		return None;
	}
	if flags.contains(SnippetFlags::LINE_START) && !at_line_start(before) {
		return None;
	}
	let start = input.cursor.checked_sub(char_len(trigger))?;
	Some(start..input.cursor)
}

fn match_pattern(regex: &fancy_regex::Regex, flags: SnippetFlags, input: &MatchInput<'_>) -> Option<(Range<CharIdx>, Vec<Option<String>>)> {
	let haystack = if flags.contains(SnippetFlags::MULTILINE) { input.prefix } else { current_line(input.prefix) };
	let caps = match regex.captures(haystack) {
		Ok(caps) => caps?,
		Err(error) => {
			tracing::debug!(pattern = regex.as_str(), %error, "trigger pattern failed to run");
			return None;
		}
	};
	let whole = caps.get(0)?;
	if whole.as_str().is_empty() || whole.end() != haystack.len() {
		return None;
	}
	if flags.contains(SnippetFlags::LINE_START) && !at_line_start(&haystack[..whole.start()]) {
		return None;
	}
	let start = input.cursor.checked_sub(char_len(whole.as_str()))?;
	let captures = caps.iter().map(|group| group.map(|m| m.as_str().to_owned())).collect();
	Some((start..input.cursor, captures))
}

/// Text after the last line break.
fn current_line(prefix: &str) -> &str {
	prefix.rfind('\n').map_or(prefix, |idx| &prefix[idx + 1..])
}

fn at_line_start(before: &str) -> bool {
	current_line(before).chars().all(char::is_whitespace)
}

/// The run of identifier characters ending the prefix.
fn trailing_word(prefix: &str) -> &str {
	let start = prefix
		.char_indices()
		.rev()
		.take_while(|(_, ch)| is_word_char(*ch))
		.last()
		.map_or(prefix.len(), |(idx, _)| idx);
	&prefix[start..]
}

/// Caches the host's math predicate for one matcher call.
struct MathGate<F> {
	predicate: F,
	cached: Option<bool>,
}

impl<F: FnMut() -> bool> MathGate<F> {
	fn new(predicate: F) -> Self {
		Self { predicate, cached: None }
	}

	fn allows(&mut self) -> bool {
		if let Some(allowed) = self.cached {
			return allowed;
		}
		let allowed = (self.predicate)();
		self.cached = Some(allowed);
		allowed
	}
}
