//! Definition sources and per-language snippet lists.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::compiler::compile;
use crate::config::PriorityPolicy;
use crate::error::{LoadError, SourceError};
use crate::snippet::SnippetDefinition;

#[cfg(test)]
mod tests;

/// Scope whose snippets are merged into every language.
pub const GLOBAL_SCOPE: &str = "all";

/// File extension of definition files.
pub const DEFINITION_EXTENSION: &str = "hsnips";

/// Where definition text comes from.
pub trait DefinitionSource {
	/// Lists the scopes this source has definitions for.
	fn scopes(&self) -> Result<Vec<String>, SourceError>;

	/// Returns the definition texts of one scope, one per file.
	///
	/// Each text is compiled on its own, so a broken file never takes its
	/// siblings down with it.
	fn read(&self, scope: &str) -> Result<Vec<String>, SourceError>;
}

/// In-memory definitions keyed by scope.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	scopes: BTreeMap<String, String>,
}

impl MemorySource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, scope: impl Into<String>, text: impl Into<String>) -> &mut Self {
		self.scopes.insert(scope.into(), text.into());
		self
	}
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for MemorySource {
	fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
		Self {
			scopes: iter.into_iter().map(|(scope, text)| (scope.into(), text.into())).collect(),
		}
	}
}

impl DefinitionSource for MemorySource {
	fn scopes(&self) -> Result<Vec<String>, SourceError> {
		Ok(self.scopes.keys().cloned().collect())
	}

	fn read(&self, scope: &str) -> Result<Vec<String>, SourceError> {
		let text = self.scopes.get(scope).cloned().ok_or_else(|| SourceError::UnknownScope(scope.to_owned()))?;
		Ok(vec![text])
	}
}

/// Every `*.hsnips` file of a directory; the scope is the lowercased file stem.
#[derive(Debug, Clone)]
pub struct DirSource {
	root: PathBuf,
}

impl DirSource {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn files(&self) -> Result<Vec<(String, PathBuf)>, SourceError> {
		let io_err = |error| SourceError::Io {
			path: self.root.clone(),
			error,
		};
		let mut files = Vec::new();
		for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
			let path = entry.map_err(io_err)?.path();
			let is_definition = path
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| ext.eq_ignore_ascii_case(DEFINITION_EXTENSION));
			if !is_definition || !path.is_file() {
				continue;
			}
			if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
				files.push((stem.to_lowercase(), path.clone()));
			}
		}
		files.sort();
		Ok(files)
	}
}

impl DefinitionSource for DirSource {
	fn scopes(&self) -> Result<Vec<String>, SourceError> {
		let mut scopes: Vec<String> = self.files()?.into_iter().map(|(scope, _)| scope).collect();
		scopes.dedup();
		Ok(scopes)
	}

	fn read(&self, scope: &str) -> Result<Vec<String>, SourceError> {
		let mut texts = Vec::new();
		for (_, path) in self.files()?.into_iter().filter(|(name, _)| name == scope) {
			texts.push(std::fs::read_to_string(&path).map_err(|error| SourceError::Io { path, error })?);
		}
		if texts.is_empty() {
			return Err(SourceError::UnknownScope(scope.to_owned()));
		}
		Ok(texts)
	}
}

/// Outcome of loading every scope of a source.
#[derive(Debug, Default)]
pub struct LoadReport {
	/// Scopes that compiled, with their snippet counts.
	pub loaded: Vec<(String, usize)>,
	/// Scopes that were rejected.
	pub failed: Vec<(String, LoadError)>,
}

impl LoadReport {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}

	pub fn snippet_count(&self) -> usize {
		self.loaded.iter().map(|(_, count)| count).sum()
	}
}

/// Compiled snippets per language, each list sorted by descending priority.
#[derive(Debug, Clone, Default)]
pub struct CompiledLanguageSet {
	languages: FxHashMap<String, Vec<Arc<SnippetDefinition>>>,
}

impl CompiledLanguageSet {
	/// Merges compiled scopes into per-language lists.
	///
	/// Global snippets are appended to every other language before sorting,
	/// so both kinds interleave by priority. Ties keep definition order with
	/// language snippets ahead of global ones.
	pub fn build<I>(compiled: I, policy: &PriorityPolicy) -> Self
	where
		I: IntoIterator<Item = (String, Vec<SnippetDefinition>)>,
	{
		let mut languages: FxHashMap<String, Vec<Arc<SnippetDefinition>>> = FxHashMap::default();
		for (scope, snippets) in compiled {
			languages.entry(scope.to_lowercase()).or_default().extend(snippets.into_iter().map(Arc::new));
		}

		if let Some(global) = languages.get(GLOBAL_SCOPE).cloned() {
			for (language, list) in languages.iter_mut() {
				if language != GLOBAL_SCOPE {
					list.extend(global.iter().cloned());
				}
			}
		}
		for list in languages.values_mut() {
			list.sort_by_key(|snippet| std::cmp::Reverse(effective_priority(snippet, policy)));
		}

		Self { languages }
	}

	/// Compiles every scope of `source`, skipping texts that fail.
	///
	/// A scope counts as loaded when at least one of its texts compiled.
	pub fn load(source: &dyn DefinitionSource, policy: &PriorityPolicy) -> Result<(Self, LoadReport), SourceError> {
		let mut report = LoadReport::default();
		let mut compiled = Vec::new();
		for scope in source.scopes()? {
			let texts = match source.read(&scope) {
				Ok(texts) => texts,
				Err(error) => {
					tracing::warn!(%scope, %error, "could not read snippet definitions");
					report.failed.push((scope, error.into()));
					continue;
				}
			};
			let mut snippets = Vec::new();
			let mut any_compiled = false;
			for (file, text) in texts.iter().enumerate() {
				match compile(text) {
					Ok(defs) => {
						snippets.extend(defs);
						any_compiled = true;
					}
					Err(error) => {
						tracing::warn!(%scope, file, %error, "rejected snippet definitions");
						report.failed.push((scope.clone(), error.into()));
					}
				}
			}
			if any_compiled {
				report.loaded.push((scope.clone(), snippets.len()));
				compiled.push((scope, snippets));
			}
		}
		Ok((Self::build(compiled, policy), report))
	}

	/// Snippets for `language`, falling back to the global scope.
	pub fn lookup(&self, language: &str) -> &[Arc<SnippetDefinition>] {
		self.languages
			.get(&language.to_lowercase())
			.or_else(|| self.languages.get(GLOBAL_SCOPE))
			.map_or(&[], Vec::as_slice)
	}

	/// Languages with a snippet list, sorted.
	pub fn languages(&self) -> Vec<&str> {
		let mut languages: Vec<&str> = self.languages.keys().map(String::as_str).collect();
		languages.sort_unstable();
		languages
	}

	pub fn is_empty(&self) -> bool {
		self.languages.is_empty()
	}
}

/// Sort key of a snippet under `policy`.
pub fn effective_priority(snippet: &SnippetDefinition, policy: &PriorityPolicy) -> i64 {
	let bonus = if snippet.trigger.is_pattern() { policy.pattern_bonus } else { 0 };
	i64::from(snippet.priority) + i64::from(bonus)
}
