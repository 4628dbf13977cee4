//! Compiles definition text into [`SnippetDefinition`]s.
//!
//! ```text
//! global
//! function pad(s) { return s.padStart(2, '0') }
//! endglobal
//!
//! priority 10
//! snippet date "today" b
//! ``rv = now('%d')``/``rv = pad(String(1))``
//! endsnippet
//! ```
//!
//! `global` sections form a preamble shared by every snippet of the source.
//! A `priority` line applies to all snippets after it. Anything else outside
//! a snippet is ignored.

mod body;
mod header;

use std::collections::VecDeque;
use std::sync::Arc;

use hypersnip_script::ast::Program;
use hypersnip_script::lexer::Pos;
use hypersnip_script::parser::parse_program_at;

use crate::error::CompileError;
use crate::generator::Generator;
use crate::snippet::SnippetDefinition;

#[cfg(test)]
mod tests;

/// Compiles one definition source.
///
/// Any error rejects the whole source; snippets are returned in definition
/// order.
pub fn compile(source: &str) -> Result<Vec<SnippetDefinition>, CompileError> {
	let mut lines: VecDeque<(usize, &str)> = source
		.split('\n')
		.map(|line| line.strip_suffix('\r').unwrap_or(line))
		.enumerate()
		.map(|(idx, line)| (idx + 1, line))
		.collect();

	let mut preamble = Program::default();
	let mut pending = Vec::new();
	let mut priority = 0;

	while let Some((line_no, line)) = lines.pop_front() {
		if line.starts_with("global") {
			preamble.body.extend(global_section(&mut lines, line_no)?.body);
		} else if header::is_header(line) {
			let header = header::parse(line, line_no)?;
			let body = body::parse(&mut lines, line_no)?;
			pending.push((header, body, priority));
		} else if let Some(value) = directive(line, "priority") {
			priority = value.parse().map_err(|_| CompileError::InvalidPriority {
				line: line_no,
				value: value.to_owned(),
			})?;
		}
	}

	let preamble = Arc::new(preamble);
	let mut snippets = Vec::with_capacity(pending.len());
	for (header, body, priority) in pending {
		let mut blocks = Vec::with_capacity(body.blocks.len());
		for block in body.blocks {
			let origin = Pos {
				line: u32::try_from(block.line).unwrap_or(u32::MAX),
				col: 1,
			};
			let program = parse_program_at(&block.code, origin).map_err(|source| CompileError::Script { line: block.line, source })?;
			blocks.push(program);
		}
		snippets.push(SnippetDefinition {
			trigger: header.trigger,
			description: header.description,
			flags: header.flags,
			priority,
			generator: Generator::new(Arc::clone(&preamble), body.segments, blocks),
		});
	}

	tracing::trace!(snippets = snippets.len(), "compiled definition source");
	Ok(snippets)
}

/// Collects and parses the lines of a `global` section.
fn global_section(lines: &mut VecDeque<(usize, &str)>, start: usize) -> Result<Program, CompileError> {
	let mut code = Vec::new();
	loop {
		match lines.pop_front() {
			Some((_, line)) if line.starts_with("endglobal") => break,
			Some((_, line)) => code.push(line),
			None => return Err(CompileError::UnterminatedGlobal { line: start }),
		}
	}
	let origin = Pos {
		line: u32::try_from(start + 1).unwrap_or(u32::MAX),
		col: 1,
	};
	parse_program_at(&code.join("\n"), origin).map_err(|source| CompileError::Script { line: start, source })
}

/// Returns the trimmed argument of `keyword <arg>` lines.
fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
	let rest = line.strip_prefix(keyword)?;
	rest.starts_with(char::is_whitespace).then(|| rest.trim())
}
