use std::cell::Cell;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::compile;
use crate::config::PriorityPolicy;
use crate::registry::CompiledLanguageSet;

fn snippets(source: &str) -> Vec<Arc<SnippetDefinition>> {
	let compiled = compile(source).unwrap();
	let set = CompiledLanguageSet::build([("test".to_owned(), compiled)], &PriorityPolicy::default());
	set.lookup("test").to_vec()
}

fn run(source: &str, prefix: &str) -> MatchResult {
	let input = MatchInput {
		prefix,
		cursor: prefix.chars().count(),
	};
	find_match(&snippets(source), &input, || false)
}

/// Compact description of a result for comparisons.
fn summary(result: &MatchResult) -> String {
	match result {
		MatchResult::AutoExpand(m) => format!("auto {} {:?} {:?}", m.snippet.label(), m.range, m.captures),
		MatchResult::Candidates(list) => {
			let labels: Vec<String> = list.iter().map(|c| format!("{}@{:?}", c.snippet.label(), c.range)).collect();
			format!("candidates [{}]", labels.join(", "))
		}
	}
}

#[rstest]
#[case("foo", true)]
#[case("say foo", true)]
#[case("line\nfoo", true)]
#[case("x.foo", true)]
#[case("xfoo", false)]
#[case("x_foo", false)]
#[case("2foo", false)]
#[case("fo", false)]
fn literal_trigger_needs_a_word_boundary(#[case] prefix: &str, #[case] expands: bool) {
	let result = run("snippet foo\nx\nendsnippet", prefix);
	assert_eq!(matches!(result, MatchResult::AutoExpand(_)), expands, "{prefix:?}");
}

#[test]
fn in_word_flag_skips_the_boundary_rule() {
	let result = run("snippet foo \"d\" i\nx\nendsnippet", "xfoo");
	assert_eq!(summary(&result), "auto d 1..4 [Some(\"foo\")]");
}

#[test]
fn ranges_are_counted_in_chars() {
	let result = run("snippet foo\nx\nendsnippet", "héé foo");
	assert_eq!(summary(&result), "auto foo 4..7 [Some(\"foo\")]");
}

#[rstest]
#[case("foo", true)]
#[case("  \tfoo", true)]
#[case("text\n  foo", true)]
#[case("a foo", false)]
fn line_start_flag(#[case] prefix: &str, #[case] expands: bool) {
	let result = run("snippet foo \"d\" b\nx\nendsnippet", prefix);
	assert_eq!(matches!(result, MatchResult::AutoExpand(_)), expands, "{prefix:?}");
}

#[test]
fn higher_priority_wins_over_definition_order() {
	let source = "snippet foo \"low\"\nx\nendsnippet\npriority 5\nsnippet foo \"high\"\nx\nendsnippet";
	let result = run(source, "foo");
	assert_eq!(summary(&result), "auto high 0..3 [Some(\"foo\")]");
}

#[test]
fn equal_priority_keeps_definition_order() {
	let source = "snippet foo \"first\"\nx\nendsnippet\nsnippet foo \"second\"\nx\nendsnippet";
	assert_eq!(summary(&run(source, "foo")), "auto first 0..3 [Some(\"foo\")]");
}

#[test]
fn pattern_captures_become_the_match_context() {
	let result = run("snippet `(\\d+)x` \"times\"\nx\nendsnippet", "abc 3x");
	assert_eq!(summary(&result), "auto times 4..6 [Some(\"3x\"), Some(\"3\")]");
}

#[test]
fn unmatched_groups_are_none() {
	let result = run("snippet `(a)?b` \"opt\"\nx\nendsnippet", "b");
	assert_eq!(summary(&result), "auto opt 0..1 [Some(\"b\"), None]");
}

#[test]
fn pattern_sees_only_the_current_line_without_multiline_flag() {
	let single = "snippet `x\\ny` \"s\"\nz\nendsnippet";
	let multi = "snippet `x\\ny` \"s\" M\nz\nendsnippet";
	assert!(matches!(run(single, "x\ny"), MatchResult::Candidates(ref list) if list.is_empty()));
	assert_eq!(summary(&run(multi, "x\ny")), "auto s 0..3 [Some(\"x\\ny\")]");
}

#[test]
fn empty_pattern_matches_are_ignored() {
	let result = run("snippet `a*` \"star\"\nx\nendsnippet", "bbb");
	assert!(matches!(result, MatchResult::Candidates(ref list) if list.is_empty()));
}

#[test]
fn lookaround_patterns_are_supported() {
	let result = run("snippet `(?<=\\$)sq` \"sq\"\nx\nendsnippet", "$sq");
	assert_eq!(summary(&result), "auto sq 1..3 [Some(\"sq\")]");
}

#[test]
fn math_snippets_need_the_math_context() {
	let source = "snippet fr \"frac\" m\nx\nendsnippet";
	let input = MatchInput { prefix: "fr", cursor: 2 };
	let list = snippets(source);

	assert!(matches!(find_match(&list, &input, || false), MatchResult::Candidates(ref c) if c.is_empty()));
	assert!(matches!(find_match(&list, &input, || true), MatchResult::AutoExpand(_)));
}

#[test]
fn math_predicate_runs_at_most_once_and_only_when_needed() {
	let calls = Cell::new(0);
	let predicate = || {
		calls.set(calls.get() + 1);
		false
	};

	let plain = snippets("snippet foo\nx\nendsnippet");
	find_match(&plain, &MatchInput { prefix: "foo", cursor: 3 }, predicate);
	assert_eq!(calls.get(), 0);

	let gated = snippets("snippet a \"a\" m\nx\nendsnippet\nsnippet b \"b\" m\nx\nendsnippet");
	find_match(&gated, &MatchInput { prefix: "zzz", cursor: 3 }, predicate);
	assert_eq!(calls.get(), 1);
}

#[test]
fn partial_words_collect_candidates_in_priority_order() {
	let source = "snippet alpha\nx\nendsnippet\nsnippet beta\nx\nendsnippet\npriority 1\nsnippet alps\nx\nendsnippet";
	assert_eq!(summary(&run(source, "x al")), "candidates [alps@2..4, alpha@2..4]");
	assert_eq!(summary(&run(source, "x ")), "candidates []");
}

#[test]
fn anonymous_snippets_never_match() {
	let result = run("snippet\nfoo\nendsnippet", "foo");
	assert!(matches!(result, MatchResult::Candidates(ref list) if list.is_empty()));
}

proptest! {
	#[test]
	fn matching_is_deterministic(prefix in "[a-c0-9 x\\n]{0,12}") {
		let source = "snippet ab\nx\nendsnippet\nsnippet `(\\d+)x`\ny\nendsnippet\nsnippet abc \"i\" i\nz\nendsnippet";
		let list = snippets(source);
		let input = MatchInput { prefix: &prefix, cursor: prefix.chars().count() };
		let first = summary(&find_match(&list, &input, || false));
		let second = summary(&find_match(&list, &input, || false));
		prop_assert_eq!(first, second);
	}
}
