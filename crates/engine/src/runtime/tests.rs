use hypersnip_script::ScriptError;
use pretty_assertions::assert_eq;

use super::*;
use crate::error::HostError;
use crate::registry::MemorySource;
use crate::testing::MemoryHost;

const SNIPPETS: &str = r#"
snippet foo "desc"
Hello ``rv = m[0].toUpperCase()``!
endsnippet

snippet `abc` "lit"
ABC
endsnippet

snippet pair
``rv = 'a'`` ``rv = 'b'``
endsnippet

snippet dep
``rv = 'a'`` ``rv = t[0] + '!'``
endsnippet

snippet guard
``rv = 'a'`` ``if (t[0] == 'x') { rv = nope } else { rv = t[0] }``
endsnippet

snippet tri
``rv = 'a'`` ``if (t[0] == 'x') { rv = nope } else { rv = t[0] }`` ``rv = t[0].toUpperCase()``
endsnippet

snippet boom
``rv = missing``
endsnippet

snippet alpha
ALPHA
endsnippet

snippet alps
ALPS
endsnippet

snippet fr "frac" m
FRAC
endsnippet
"#;

fn engine_with(config: EngineConfig) -> SnippetEngine {
	let _ = tracing_subscriber::fmt::try_init();
	let mut engine = SnippetEngine::new(config);
	let source: MemorySource = [("rust", SNIPPETS)].into_iter().collect();
	let report = engine.load(&source).unwrap();
	assert!(report.is_clean(), "{:?}", report.failed);
	engine
}

fn engine() -> SnippetEngine {
	engine_with(EngineConfig::default())
}

/// Types `text` one char at a time starting at `pos`.
fn type_chars(engine: &mut SnippetEngine, host: &mut MemoryHost, doc: DocId, pos: CharIdx, text: &str) -> ChangeReport {
	let mut last = ChangeReport::default();
	for (i, ch) in text.chars().enumerate() {
		let change = host.type_text(doc, pos + i, &ch.to_string()).unwrap();
		last = engine.on_document_changed(host, change).unwrap();
	}
	last
}

fn edit(engine: &mut SnippetEngine, host: &mut MemoryHost, doc: DocId, change: Change) -> ChangeReport {
	let change = host.edit(doc, vec![change]).unwrap();
	engine.on_document_changed(host, change).unwrap()
}

#[test]
fn typing_a_trigger_expands_it() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");

	let report = type_chars(&mut engine, &mut host, doc, 0, "foo");

	let expansion = report.expanded.unwrap();
	assert_eq!(expansion.text, "Hello FOO!");
	assert_eq!(host.text_of(doc), "Hello FOO!");
	assert_eq!(host.templates, vec!["Hello ${1:FOO}!$0".to_owned()]);
	assert_eq!(host.last_selection(), Some(6..9));
	assert_eq!(engine.instances().len(), 1);
	assert!(!engine.is_inserting());
}

#[test]
fn expansion_without_blocks_is_not_tracked() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "x ");

	let report = type_chars(&mut engine, &mut host, doc, 2, "abc");

	assert!(report.expanded.is_some());
	assert_eq!(host.text_of(doc), "x ABC");
	assert!(engine.instances().is_empty());
	assert_eq!(host.last_selection(), Some(5..5));
}

#[test]
fn failing_generator_leaves_the_document_alone() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");

	let report = type_chars(&mut engine, &mut host, doc, 0, "boom");

	assert!(report.expanded.is_none());
	assert!(matches!(report.errors.as_slice(), [EngineError::Script(_)]));
	assert_eq!(host.text_of(doc), "boom");
	assert!(host.templates.is_empty());
	assert!(!engine.is_inserting());
}

#[test]
fn failed_template_insertion_clears_the_inserting_flag() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	host.fail_insert = true;

	let report = type_chars(&mut engine, &mut host, doc, 0, "foo");
	assert!(report.expanded.is_none());
	assert!(matches!(report.errors.as_slice(), [EngineError::Host(HostError::Other(_))]));
	assert!(!engine.is_inserting());
	assert!(engine.instances().is_empty());

	host.fail_insert = false;
	let pos = host.text_of(doc).chars().count();
	let report = type_chars(&mut engine, &mut host, doc, pos, "foo");
	assert!(report.expanded.is_some());
	assert_eq!(host.text_of(doc), "Hello FOO!");
}

#[test]
fn pasted_text_is_not_a_keystroke() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	let change = host.type_text(doc, 0, "foo").unwrap();
	let report = engine.on_document_changed(&mut host, change).unwrap();
	assert!(report.expanded.is_none());

	let mut engine = engine_with(EngineConfig {
		keystroke_only: false,
		..EngineConfig::default()
	});
	let doc = host.open("rust", "");
	let change = host.type_text(doc, 0, "foo").unwrap();
	let report = engine.on_document_changed(&mut host, change).unwrap();
	assert!(report.expanded.is_some());
}

#[test]
fn inactive_documents_do_not_expand() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let background = host.open("rust", "");
	host.open("rust", "");

	let report = type_chars(&mut engine, &mut host, background, 0, "foo");
	assert!(report.expanded.is_none());
	assert_eq!(host.text_of(background), "foo");
}

#[test]
fn editing_a_placeholder_updates_dependent_blocks() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "dep");
	assert_eq!(host.text_of(doc), "a a!");

	let report = edit(&mut engine, &mut host, doc, Change::replace(0..1, "bc"));
	assert_eq!(report.patched, 1);
	assert_eq!(host.text_of(doc), "bc bc!");

	let report = type_chars(&mut engine, &mut host, doc, 2, "d");
	assert_eq!(report.patched, 1);
	assert_eq!(host.text_of(doc), "bcd bcd!");

	let top = engine.instances().top().unwrap();
	let ranges: Vec<Range<CharIdx>> = top.placeholders().iter().map(|p| p.range.clone()).collect();
	assert_eq!(ranges, vec![0..3, 4..8, 8..8]);
	assert_eq!(top.values().to_vec(), vec!["a".to_owned(), "bcd!".to_owned()]);
}

#[test]
fn unchanged_dependent_values_are_not_patched() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");

	let report = edit(&mut engine, &mut host, doc, Change::replace(0..1, "zz"));
	assert_eq!(report.patched, 0);
	assert_eq!(host.text_of(doc), "zz b");
}

#[test]
fn failed_propagation_keeps_prior_text_and_instance() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "guard");
	assert_eq!(host.text_of(doc), "a a");

	let report = edit(&mut engine, &mut host, doc, Change::replace(0..1, "x"));
	assert!(matches!(report.errors.as_slice(), [EngineError::Script(_)]));
	assert_eq!(report.patched, 0);
	assert_eq!(host.text_of(doc), "x a");
	assert_eq!(engine.instances().len(), 1);
}

#[test]
fn failing_block_does_not_stop_later_blocks() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "tri");
	assert_eq!(host.text_of(doc), "a a A");

	let report = edit(&mut engine, &mut host, doc, Change::replace(0..1, "x"));
	assert_eq!(report.patched, 1);
	assert!(matches!(report.errors.as_slice(), [EngineError::Script(ScriptError::Undefined(name))] if name == "nope"));
	assert_eq!(host.text_of(doc), "x a X");
	assert_eq!(engine.instances().top().unwrap().values().to_vec(), vec!["a".to_owned(), "a".to_owned(), "X".to_owned()]);
}

#[test]
fn edits_outside_placeholders_only_shift_ranges() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "// ");
	type_chars(&mut engine, &mut host, doc, 3, "dep");
	assert_eq!(host.text_of(doc), "// a a!");

	let report = edit(&mut engine, &mut host, doc, Change::insert(0, "> "));
	assert_eq!(report.patched, 0);
	assert_eq!(host.text_of(doc), "> // a a!");
	let top = engine.instances().top().unwrap();
	assert_eq!(top.range(), 5..9);
	assert_eq!(top.placeholders()[1].range, 7..9);
}

#[test]
fn navigation_walks_placeholders_then_defers() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");
	assert_eq!(host.last_selection(), Some(0..1));

	assert_eq!(engine.next_placeholder(&mut host).unwrap(), NavOutcome::Moved);
	assert_eq!(host.last_selection(), Some(2..3));
	assert_eq!(engine.prev_placeholder(&mut host).unwrap(), NavOutcome::Moved);
	assert_eq!(host.last_selection(), Some(0..1));
	engine.next_placeholder(&mut host).unwrap();
	assert_eq!(engine.next_placeholder(&mut host).unwrap(), NavOutcome::Moved);
	assert_eq!(host.last_selection(), Some(3..3));

	assert_eq!(engine.next_placeholder(&mut host).unwrap(), NavOutcome::Deferred);
	assert!(engine.instances().is_empty());
	assert_eq!(host.native_moves, vec![Direction::Forward]);
}

#[test]
fn backward_from_the_first_placeholder_pops_the_instance() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");

	assert_eq!(engine.prev_placeholder(&mut host).unwrap(), NavOutcome::Deferred);
	assert!(engine.instances().is_empty());
	assert_eq!(host.native_moves, vec![Direction::Backward]);
}

#[test]
fn selection_outside_the_instance_pops_it() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");

	assert_eq!(engine.on_selection_changed(doc, &[3..3]), 0);
	assert_eq!(engine.on_selection_changed(DocId(99), &[0..0]), 1);
	assert!(engine.instances().is_empty());
}

#[test]
fn leave_snippet_clears_everything() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");

	engine.leave_snippet(&mut host);
	assert!(engine.instances().is_empty());
	assert_eq!(host.native_leaves, 1);
}

#[test]
fn completion_lists_and_expands_candidates() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "al");

	let labels: Vec<String> = engine.complete(&host, doc, 2).unwrap().iter().map(|c| c.snippet.label().to_owned()).collect();
	assert_eq!(labels, vec!["alpha", "alps"]);

	assert!(engine.request_completion(&mut host, doc, 2).unwrap().is_none());
	assert_eq!(host.text_of(doc), "al");

	host.choice = Some(1);
	let expansion = engine.request_completion(&mut host, doc, 2).unwrap().unwrap();
	assert_eq!(expansion.replace, 0..2);
	assert_eq!(host.text_of(doc), "ALPS");
	assert_eq!(host.presented.len(), 2);
}

#[test]
fn math_snippets_follow_the_host_predicate() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "f");
	let labels = |engine: &SnippetEngine, host: &MemoryHost| -> Vec<String> {
		engine.complete(host, doc, 1).unwrap().iter().map(|c| c.snippet.label().to_owned()).collect()
	};
	assert_eq!(labels(&engine, &host), vec!["desc"]);

	host.math = true;
	assert_eq!(labels(&engine, &host), vec!["desc", "frac"]);
	let report = type_chars(&mut engine, &mut host, doc, 1, "r");
	assert!(report.expanded.is_some());
	assert_eq!(host.text_of(doc), "FRAC");
}

#[test]
fn reload_replaces_snippets_but_keeps_instances() {
	let mut engine = engine();
	let mut host = MemoryHost::new();
	let doc = host.open("rust", "");
	type_chars(&mut engine, &mut host, doc, 0, "pair");

	let source: MemorySource = [("rust", "snippet other\nx\nendsnippet")].into_iter().collect();
	let report = engine.on_definition_saved(&source).unwrap();
	assert_eq!(report.snippet_count(), 1);
	assert_eq!(engine.instances().len(), 1);
	assert_eq!(engine.instances().top().unwrap().snippet().trigger.as_str(), "pair");

	engine.reset();
	assert!(engine.instances().is_empty());
	assert!(engine.snippets().is_empty());
}
