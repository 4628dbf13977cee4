use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::snippet::{Segment, SnippetFlags, Trigger};

fn lit(text: &str) -> Segment {
	Segment::Literal(text.to_owned())
}

fn single(source: &str) -> SnippetDefinition {
	let mut snippets = compile(source).unwrap();
	assert_eq!(snippets.len(), 1);
	snippets.remove(0)
}

#[rstest]
#[case("snippet foo", "foo", false)]
#[case("snippet foo_2 \"with description\"", "foo_2", false)]
#[case("snippet `(\\d+)x`", "(\\d+)x$", true)]
#[case("snippet `^ab$`", "^ab$", true)]
#[case("snippet", "", false)]
fn parses_trigger_forms(#[case] header: &str, #[case] trigger: &str, #[case] pattern: bool) {
	let snippet = single(&format!("{header}\nbody\nendsnippet"));
	assert_eq!(snippet.trigger.as_str(), trigger);
	assert_eq!(snippet.trigger.is_pattern(), pattern);
}

#[test]
fn header_carries_description_and_flags() {
	let snippet = single("snippet fr \"fraction\" imb\nx\nendsnippet");
	assert_eq!(snippet.description, "fraction");
	assert_eq!(snippet.flags, SnippetFlags::IN_WORD | SnippetFlags::MATH | SnippetFlags::LINE_START);
	assert_eq!(snippet.label(), "fraction");
}

#[test]
fn unknown_flags_are_ignored() {
	let snippet = single("snippet x \"d\" AiZ\nx\nendsnippet");
	assert_eq!(snippet.flags, SnippetFlags::IN_WORD);
}

#[test]
fn automatic_expansion_flag_is_accepted_without_effect() {
	assert_eq!(single("snippet x \"d\" A\nx\nendsnippet").flags, SnippetFlags::empty());
	assert_eq!(single("snippet x \"d\" Ab\nx\nendsnippet").flags, SnippetFlags::LINE_START);
}

#[test]
fn anonymous_snippet_has_no_trigger() {
	assert!(matches!(single("snippet\nx\nendsnippet").trigger, Trigger::Anonymous));
}

#[test]
fn invalid_header_rejects_the_whole_source() {
	let source = "snippet ok\nfine\nendsnippet\n\nsnippet bad \"open\nx\nendsnippet";
	let err = compile(source).unwrap_err();
	assert!(matches!(err, CompileError::InvalidHeader { line: 5, .. }));
}

#[test]
fn invalid_pattern_is_a_compile_error() {
	let err = compile("snippet `(ab`\nx\nendsnippet").unwrap_err();
	assert!(matches!(err, CompileError::InvalidPattern { line: 1, .. }));
}

#[test]
fn inline_block_splits_literals() {
	let snippet = single("snippet foo \"desc\"\nHello ``rv = m[0].toUpperCase()`` !\nendsnippet");
	assert_eq!(snippet.generator.segments(), &[lit("Hello "), Segment::BlockRef(0), lit(" !")]);
	assert_eq!(snippet.generator.block_count(), 1);
}

#[test]
fn literal_lines_end_with_newline_segments_except_the_last() {
	let snippet = single("snippet two\nfirst\n\nlast\nendsnippet");
	assert_eq!(snippet.generator.segments(), &[lit("first"), lit("\n"), lit("\n"), lit("last")]);
}

#[test]
fn blocks_may_span_lines() {
	let source = "snippet x\na``\n  let s = 'q'\n  rv = s``b\nc\nendsnippet";
	let snippet = single(source);
	assert_eq!(
		snippet.generator.segments(),
		&[lit("a"), Segment::BlockRef(0), lit("b"), lit("\n"), lit("c")]
	);
}

#[test]
fn several_blocks_on_one_line_are_numbered_in_order() {
	let snippet = single("snippet x\n``rv = 1``-``rv = 2``\nendsnippet");
	assert_eq!(snippet.generator.segments(), &[Segment::BlockRef(0), lit("-"), Segment::BlockRef(1)]);
}

#[test]
fn empty_body_has_no_segments() {
	assert!(single("snippet x\nendsnippet").generator.segments().is_empty());
}

#[test]
fn crlf_line_endings_are_accepted() {
	let snippet = single("snippet x\r\nab\r\ncd\r\nendsnippet\r\n");
	assert_eq!(snippet.generator.segments(), &[lit("ab"), lit("\n"), lit("cd")]);
}

#[test]
fn priority_applies_to_following_snippets() {
	let snippets = compile("snippet a\nx\nendsnippet\npriority 5\nsnippet b\nx\nendsnippet\npriority -1\nsnippet c\nx\nendsnippet").unwrap();
	let priorities: Vec<i32> = snippets.iter().map(|s| s.priority).collect();
	assert_eq!(priorities, vec![0, 5, -1]);
}

#[test]
fn malformed_priority_is_rejected() {
	let err = compile("priority high\nsnippet a\nx\nendsnippet").unwrap_err();
	assert!(matches!(err, CompileError::InvalidPriority { line: 1, .. }));
}

#[rstest]
#[case("global\nlet x = 1\n", 1)]
#[case("snippet a\nx ``rv = 1\nendsnippet", 2)]
#[case("snippet a\ntext\n", 1)]
fn unterminated_sections_report_their_start(#[case] source: &str, #[case] line: usize) {
	let err = compile(source).unwrap_err();
	let reported = match err {
		CompileError::UnterminatedGlobal { line } | CompileError::UnterminatedBlock { line } | CompileError::UnterminatedSnippet { line } => line,
		other => panic!("unexpected error {other}"),
	};
	assert_eq!(reported, line);
}

#[test]
fn block_syntax_error_fails_the_source() {
	let err = compile("snippet a\n``rv = (``\nendsnippet").unwrap_err();
	assert!(matches!(err, CompileError::Script { line: 2, .. }));
}

#[test]
fn global_sections_are_shared_and_concatenated() {
	let source = "\
global
function twice(s) { return s + s }
endglobal
snippet a
``rv = twice(suffix)``
endsnippet
global
const suffix = '!'
endglobal
snippet b
``rv = twice('b')``
endsnippet";
	let snippets = compile(source).unwrap();
	let limits = hypersnip_script::ScriptLimits::default();
	let a = snippets[0].generator.run(&[Some("a".into())], &limits).unwrap();
	let b = snippets[1].generator.run(&[Some("b".into())], &limits).unwrap();
	assert_eq!(a.block_values, vec!["!!".to_owned()]);
	assert_eq!(b.block_values, vec!["bb".to_owned()]);
}
