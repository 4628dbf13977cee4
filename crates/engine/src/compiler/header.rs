use std::sync::LazyLock;

use fancy_regex::Regex as PatternRegex;
use regex::Regex;

use crate::error::CompileError;
use crate::snippet::{SnippetFlags, Trigger};

/// Group 1: literal trigger, 2: pattern source, 3: description, 4: flags.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"^snippet ?(?:([\w\d_]+)|`([^`]+)`)?(?: "([^"]+)")?(?: ([A-Za-z]*))?\s*$"#).expect("snippet header grammar is a valid regex")
});

#[derive(Debug)]
pub(super) struct Header {
	pub trigger: Trigger,
	pub description: String,
	pub flags: SnippetFlags,
}

/// Returns true if `line` starts with the `snippet` keyword.
pub(super) fn is_header(line: &str) -> bool {
	line.strip_prefix("snippet").is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

pub(super) fn parse(line: &str, line_no: usize) -> Result<Header, CompileError> {
	let invalid = || CompileError::InvalidHeader {
		line: line_no,
		text: line.to_owned(),
	};
	let caps = HEADER.captures(line).ok_or_else(invalid)?;

	let trigger = match (caps.get(1), caps.get(2)) {
		(Some(word), _) => Trigger::Literal(word.as_str().to_owned()),
		(None, Some(pattern)) => {
			let mut source = pattern.as_str().to_owned();
			if !source.ends_with('$') {
				source.push('$');
			}
			let regex = PatternRegex::new(&source).map_err(|source| CompileError::InvalidPattern {
				line: line_no,
				source: Box::new(source),
			})?;
			Trigger::Pattern(regex)
		}
		(None, None) => Trigger::Anonymous,
	};

	Ok(Header {
		trigger,
		description: caps.get(3).map_or_else(String::new, |m| m.as_str().to_owned()),
		flags: caps.get(4).map_or_else(SnippetFlags::empty, |m| SnippetFlags::parse(m.as_str())),
	})
}
