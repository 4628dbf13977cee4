use std::collections::VecDeque;

use crate::error::CompileError;
use crate::snippet::Segment;

/// Marks the start and the end of an inline code block.
pub(super) const BLOCK_DELIMITER: &str = "``";

/// Raw code of one block and the line it starts on.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct BlockSource {
	pub code: String,
	pub line: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Body {
	pub segments: Vec<Segment>,
	pub blocks: Vec<BlockSource>,
}

/// Consumes body lines up to and including `endsnippet`.
///
/// Lines are streamed: whatever follows a delimiter on a line is pushed back
/// and scanned again in the opposite mode, so a line may hold several blocks
/// and a block may span several lines. Each literal line is followed by a
/// newline segment; the final one is dropped.
pub(super) fn parse<'a>(lines: &mut VecDeque<(usize, &'a str)>, header_line: usize) -> Result<Body, CompileError> {
	let mut body = Body::default();
	let mut open_block: Option<(usize, Vec<&'a str>)> = None;

	loop {
		let Some((line_no, line)) = lines.pop_front() else {
			return Err(match open_block {
				Some((start, _)) => CompileError::UnterminatedBlock { line: start },
				None => CompileError::UnterminatedSnippet { line: header_line },
			});
		};

		match open_block.take() {
			Some((start, mut code)) => match line.split_once(BLOCK_DELIMITER) {
				Some((head, rest)) => {
					code.push(head.trim());
					body.segments.push(Segment::BlockRef(body.blocks.len()));
					body.blocks.push(BlockSource { code: code.join("\n"), line: start });
					lines.push_front((line_no, rest));
				}
				None if line.starts_with("endsnippet") => return Err(CompileError::UnterminatedBlock { line: start }),
				None => {
					code.push(line.trim());
					open_block = Some((start, code));
				}
			},
			None => {
				if line.starts_with("endsnippet") {
					break;
				}
				match line.split_once(BLOCK_DELIMITER) {
					Some((text, rest)) => {
						if !text.is_empty() {
							body.segments.push(Segment::Literal(text.to_owned()));
						}
						lines.push_front((line_no, rest));
						open_block = Some((line_no, Vec::new()));
					}
					None => {
						if !line.is_empty() {
							body.segments.push(Segment::Literal(line.to_owned()));
						}
						body.segments.push(Segment::Literal("\n".to_owned()));
					}
				}
			}
		}
	}

	if matches!(body.segments.last(), Some(Segment::Literal(text)) if text == "\n") {
		body.segments.pop();
	}
	Ok(body)
}
