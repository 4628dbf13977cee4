//! Compiled snippet definitions.

use std::fmt;

use bitflags::bitflags;
use fancy_regex::Regex;

use crate::generator::Generator;

bitflags! {
	/// Single-letter modifiers from a snippet header.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct SnippetFlags: u8 {
		/// `i`: expand even when the trigger ends a longer word.
		const IN_WORD = 1 << 0;
		/// `m`: only expand where the host reports a math context.
		const MATH = 1 << 1;
		/// `b`: only whitespace may precede the trigger on its line.
		const LINE_START = 1 << 2;
		/// `M`: match pattern triggers against the multi-line context.
		const MULTILINE = 1 << 3;
	}
}

impl SnippetFlags {
	/// Parses a run of flag letters. Unknown letters are skipped.
	///
	/// `A` (automatic expansion) is accepted and has no effect: every full
	/// trigger match typed as a keystroke already expands.
	pub fn parse(letters: &str) -> Self {
		let mut flags = Self::empty();
		for letter in letters.chars() {
			match letter {
				'i' => flags |= Self::IN_WORD,
				'm' => flags |= Self::MATH,
				'b' => flags |= Self::LINE_START,
				'M' => flags |= Self::MULTILINE,
				'A' => {}
				other => tracing::debug!(flag = %other, "ignoring unknown snippet flag"),
			}
		}
		flags
	}
}

/// What has to be typed before the cursor for a snippet to match.
#[derive(Clone)]
pub enum Trigger {
	/// `snippet` with no trigger; never matched.
	Anonymous,
	/// A literal word.
	Literal(String),
	/// A pattern anchored at the end of input.
	Pattern(Regex),
}

impl Trigger {
	pub fn is_pattern(&self) -> bool {
		matches!(self, Self::Pattern(_))
	}

	/// Literal text or pattern source, empty for anonymous snippets.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Anonymous => "",
			Self::Literal(word) => word,
			Self::Pattern(regex) => regex.as_str(),
		}
	}
}

impl fmt::Debug for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Anonymous => f.write_str("Anonymous"),
			Self::Literal(word) => f.debug_tuple("Literal").field(word).finish(),
			Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
		}
	}
}

/// One piece of a generator's structural output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(String),
	/// Index into the generator's block list.
	BlockRef(usize),
}

/// An immutable, compiled snippet.
#[derive(Debug)]
pub struct SnippetDefinition {
	pub trigger: Trigger,
	pub description: String,
	pub flags: SnippetFlags,
	pub priority: i32,
	pub generator: Generator,
}

impl SnippetDefinition {
	/// Text shown for the snippet in candidate lists.
	pub fn label(&self) -> &str {
		if self.description.is_empty() { self.trigger.as_str() } else { &self.description }
	}

	pub fn is_math(&self) -> bool {
		self.flags.contains(SnippetFlags::MATH)
	}
}
