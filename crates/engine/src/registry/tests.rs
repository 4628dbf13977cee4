use pretty_assertions::assert_eq;

use super::*;
use crate::error::CompileError;

fn triggers(set: &CompiledLanguageSet, language: &str) -> Vec<String> {
	set.lookup(language).iter().map(|s| s.trigger.as_str().to_owned()).collect()
}

fn snippet(trigger: &str) -> String {
	format!("snippet {trigger}\nx\nendsnippet\n")
}

#[test]
fn global_snippets_are_merged_after_language_snippets() {
	let source: MemorySource = [("rust", snippet("fn") + &snippet("st")), ("all", snippet("date"))].into_iter().collect();
	let (set, report) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();

	assert!(report.is_clean());
	assert_eq!(report.snippet_count(), 3);
	assert_eq!(triggers(&set, "rust"), vec!["fn", "st", "date"]);
	assert_eq!(triggers(&set, "all"), vec!["date"]);
}

#[test]
fn unknown_language_falls_back_to_global_scope() {
	let source: MemorySource = [("all", snippet("date"))].into_iter().collect();
	let (set, _) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert_eq!(triggers(&set, "python"), vec!["date"]);

	let empty = CompiledLanguageSet::default();
	assert!(empty.lookup("python").is_empty());
}

#[test]
fn higher_priority_sorts_first_and_ties_keep_order() {
	let rust = format!("{}priority 3\n{}{}", snippet("a"), snippet("b"), snippet("c"));
	let all = format!("priority 3\n{}", snippet("g"));
	let source: MemorySource = [("rust", rust), ("all", all)].into_iter().collect();
	let (set, _) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert_eq!(triggers(&set, "rust"), vec!["b", "c", "g", "a"]);
}

#[test]
fn pattern_bonus_lifts_pattern_triggers() {
	let source: MemorySource = [("tex", snippet("ab") + &snippet("`ab`"))].into_iter().collect();

	let (plain, _) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert_eq!(triggers(&plain, "tex"), vec!["ab", "ab$"]);

	let policy = PriorityPolicy { pattern_bonus: 1 };
	let (boosted, _) = CompiledLanguageSet::load(&source, &policy).unwrap();
	assert_eq!(triggers(&boosted, "tex"), vec!["ab$", "ab"]);
}

#[test]
fn failing_scope_is_reported_and_others_still_load() {
	let source: MemorySource = [("rust", snippet("fn")), ("tex", "snippet broken\nno end".to_owned())].into_iter().collect();
	let (set, report) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();

	assert!(!report.is_clean());
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].0, "tex");
	assert!(matches!(report.failed[0].1, LoadError::Compile(CompileError::UnterminatedSnippet { line: 1 })));
	assert_eq!(set.languages(), vec!["rust"]);
}

#[test]
fn scopes_are_case_insensitive() {
	let source: MemorySource = [("Rust", snippet("fn"))].into_iter().collect();
	let (set, _) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert_eq!(triggers(&set, "RUST"), vec!["fn"]);
}

#[test]
fn memory_source_rejects_unknown_scope() {
	let source = MemorySource::new();
	assert!(matches!(source.read("rust"), Err(SourceError::UnknownScope(scope)) if scope == "rust"));
}

#[test]
fn dir_source_reads_definition_files() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("Rust.hsnips"), snippet("fn")).unwrap();
	std::fs::write(dir.path().join("all.HSNIPS"), snippet("date")).unwrap();
	std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

	let source = DirSource::new(dir.path());
	assert_eq!(source.scopes().unwrap(), vec!["all", "rust"]);
	assert_eq!(source.read("rust").unwrap(), vec![snippet("fn")]);

	let (set, report) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert!(report.is_clean());
	assert_eq!(triggers(&set, "rust"), vec!["fn", "date"]);
}

#[test]
fn dir_source_missing_directory_is_an_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let source = DirSource::new(dir.path().join("missing"));
	assert!(matches!(source.scopes(), Err(SourceError::Io { .. })));
}

#[test]
#[cfg(target_os = "linux")]
fn files_sharing_a_scope_compile_independently() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("Rust.hsnips"), "snippet broken\nno end\n").unwrap();
	std::fs::write(dir.path().join("rust.hsnips"), snippet("fn")).unwrap();

	let source = DirSource::new(dir.path());
	assert_eq!(source.scopes().unwrap(), vec!["rust"]);
	assert_eq!(source.read("rust").unwrap().len(), 2);

	let (set, report) = CompiledLanguageSet::load(&source, &PriorityPolicy::default()).unwrap();
	assert_eq!(report.loaded, vec![("rust".to_owned(), 1)]);
	assert_eq!(report.failed.len(), 1);
	assert!(matches!(report.failed[0].1, LoadError::Compile(CompileError::UnterminatedSnippet { line: 1 })));
	assert_eq!(triggers(&set, "rust"), vec!["fn"]);
}
