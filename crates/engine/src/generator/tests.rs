use pretty_assertions::assert_eq;

use crate::compile;
use crate::snippet::SnippetDefinition;
use hypersnip_script::{ScriptError, ScriptLimits};

fn snippet(body: &str) -> SnippetDefinition {
	compile(&format!("snippet t\n{body}\nendsnippet")).unwrap().remove(0)
}

fn values(out: super::ExpansionOutput) -> Vec<String> {
	out.block_values
}

#[test]
fn running_value_resets_between_blocks() {
	let snippet = snippet("``rv += 'a'````rv += 'b'``");
	let out = snippet.generator.run(&[Some("t".into())], &ScriptLimits::default()).unwrap();
	assert_eq!(values(out), vec!["a", "b"]);
}

#[test]
fn blocks_share_one_scope() {
	let snippet = snippet("``let n = 2; rv = n`` ``rv = n * 3``");
	let out = snippet.generator.run(&[], &ScriptLimits::default()).unwrap();
	assert_eq!(values(out), vec!["2", "6"]);
}

#[test]
fn placeholder_texts_grow_during_synthesis() {
	let snippet = snippet("``rv = 'x'`` ``rv = t.length + ':' + t[0]``");
	let out = snippet.generator.run(&[], &ScriptLimits::default()).unwrap();
	assert_eq!(values(out), vec!["x", "1:x"]);
}

#[test]
fn rerun_keeps_live_texts_for_edited_prefix() {
	let snippet = snippet("``rv = 'hello'`` ``rv = t[0].toUpperCase()``");
	let rerun = snippet.generator.rerun(&[], &["edited".to_owned()], &[], &ScriptLimits::default()).unwrap();
	assert!(rerun.failures.is_empty());
	assert_eq!(values(rerun.output), vec!["hello", "EDITED"]);
}

#[test]
fn rerun_keeps_previous_value_of_a_failing_block_and_continues() {
	let snippet = snippet("``rv = 'a'`` ``if (t[0] == 'x') { rv = nope } else { rv = t[0] }`` ``rv = t[0].toUpperCase() + t[1]``");
	let previous = vec!["a".to_owned(), "a".to_owned(), "Aa".to_owned()];
	let rerun = snippet.generator.rerun(&[], &["x".to_owned()], &previous, &ScriptLimits::default()).unwrap();

	assert_eq!(rerun.failures, vec![(1, ScriptError::Undefined("nope".into()))]);
	assert_eq!(values(rerun.output), vec!["a", "a", "Xa"]);
}

#[test]
fn rerun_fails_outright_when_the_preamble_fails() {
	let snippets = compile("global\nlet x = missing\nendglobal\nsnippet t\n``rv = 1``\nendsnippet").unwrap();
	let err = snippets[0].generator.rerun(&[], &["1".to_owned()], &[], &ScriptLimits::default()).unwrap_err();
	assert_eq!(err, ScriptError::Undefined("missing".into()));
}

#[test]
fn match_context_exposes_captures() {
	let snippet = snippet("``rv = m[1] + ' times' + (m[2] === undefined ? '' : '!')``");
	let out = snippet.generator.run(&[Some("3x".into()), Some("3".into()), None], &ScriptLimits::default()).unwrap();
	assert_eq!(values(out), vec!["3 times"]);
}

#[test]
fn runtime_errors_abort_the_run() {
	let snippet = snippet("``rv = missing``");
	let err = snippet.generator.run(&[], &ScriptLimits::default()).unwrap_err();
	assert_eq!(err, ScriptError::Undefined("missing".into()));
}

#[test]
fn step_budget_covers_the_whole_run() {
	let snippet = snippet("``for (let i = 0; i < 40; i++) {}`` ``for (let i = 0; i < 40; i++) {}``");
	let limits = ScriptLimits {
		max_steps: 100,
		..ScriptLimits::default()
	};
	assert!(matches!(snippet.generator.run(&[], &limits), Err(ScriptError::StepLimit(100))));
}
