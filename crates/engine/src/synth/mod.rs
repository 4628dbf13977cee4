//! Turns one generator run into an editor template.
//!
//! Literal segments are copied verbatim, each block becomes a numbered
//! placeholder `${n:value}` and the template always ends with the exit stop
//! `$0`. Placeholder numbers follow the order in which blocks first appear.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use hypersnip_primitives::range::char_len;
use hypersnip_primitives::{CharIdx, CharLen};
use hypersnip_script::{Result, ScriptLimits};

use crate::snippet::{Segment, SnippetDefinition};

#[cfg(test)]
mod tests;

/// Number of the exit stop placed after the expanded text.
pub const EXIT_PLACEHOLDER: u32 = 0;

/// One placeholder of an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
	pub number: u32,
	/// Block that computes the placeholder text; `None` for the exit stop.
	pub block: Option<usize>,
	/// Span within [`Expansion::text`], in chars.
	pub span: Range<CharLen>,
}

/// A synthesized expansion, ready to be inserted.
#[derive(Debug, Clone)]
pub struct Expansion {
	pub snippet: Arc<SnippetDefinition>,
	pub captures: Vec<Option<String>>,
	/// Host snippet syntax with escaped literals.
	pub template: String,
	/// The text the template renders to.
	pub text: String,
	/// Document range the expansion replaces.
	pub replace: Range<CharIdx>,
	/// Placeholders in text order, the exit stop last.
	pub placeholders: Vec<Placeholder>,
	pub first_placeholder: u32,
	pub block_values: Vec<String>,
	/// Placeholder number to block index.
	pub placeholder_blocks: BTreeMap<u32, usize>,
}

impl Expansion {
	/// Whether the expansion needs a live instance.
	pub fn is_tracked(&self) -> bool {
		self.placeholders.len() > 1
	}

	pub fn placeholder(&self, number: u32) -> Option<&Placeholder> {
		self.placeholders.iter().find(|p| p.number == number)
	}
}

/// Runs the snippet's generator once and assembles its template.
///
/// Fails before producing anything if a block fails.
pub fn synthesize(snippet: &Arc<SnippetDefinition>, captures: Vec<Option<String>>, replace: Range<CharIdx>, limits: &ScriptLimits) -> Result<Expansion> {
	let output = snippet.generator.run(&captures, limits)?;

	let mut template = String::new();
	let mut text = String::new();
	let mut text_len = 0;
	let mut placeholders = Vec::new();
	let mut placeholder_blocks = BTreeMap::new();
	let mut numbers: BTreeMap<usize, u32> = BTreeMap::new();

	for segment in &output.segments {
		match segment {
			Segment::Literal(literal) => {
				escape_into(&mut template, literal);
				text.push_str(literal);
				text_len += char_len(literal);
			}
			Segment::BlockRef(block) => {
				let next = u32::try_from(numbers.len() + 1).unwrap_or(u32::MAX);
				let number = *numbers.entry(*block).or_insert(next);
				placeholder_blocks.insert(number, *block);

				let value = output.block_values.get(*block).map_or("", String::as_str);
				template.push_str(&format!("${{{number}:"));
				escape_into(&mut template, value);
				template.push('}');
				text.push_str(value);

				let len = char_len(value);
				placeholders.push(Placeholder {
					number,
					block: Some(*block),
					span: text_len..text_len + len,
				});
				text_len += len;
			}
		}
	}

	template.push_str("$0");
	placeholders.push(Placeholder {
		number: EXIT_PLACEHOLDER,
		block: None,
		span: text_len..text_len,
	});
	let first_placeholder = placeholders.iter().map(|p| p.number).filter(|n| *n != EXIT_PLACEHOLDER).min().unwrap_or(EXIT_PLACEHOLDER);

	Ok(Expansion {
		snippet: Arc::clone(snippet),
		captures,
		template,
		text,
		replace,
		placeholders,
		first_placeholder,
		block_values: output.block_values,
		placeholder_blocks,
	})
}

/// Escapes the characters that carry meaning in snippet syntax.
pub fn escape_into(out: &mut String, text: &str) {
	for ch in text.chars() {
		if matches!(ch, '\\' | '$' | '}') {
			out.push('\\');
		}
		out.push(ch);
	}
}

/// Renders snippet syntax to plain text: placeholders become their default
/// value, tabstops vanish and escapes are resolved.
pub fn render_template(template: &str) -> String {
	let mut out = String::with_capacity(template.len());
	let mut chars = template.chars().peekable();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => {
				if let Some(escaped) = chars.next() {
					out.push(escaped);
				}
			}
			'$' => match chars.peek() {
				Some('{') => {
					chars.next();
					while chars.next_if(char::is_ascii_digit).is_some() {}
					chars.next_if_eq(&':');
				}
				Some('0'..='9') => while chars.next_if(char::is_ascii_digit).is_some() {},
				_ => out.push('$'),
			},
			'}' => {}
			other => out.push(other),
		}
	}
	out
}
