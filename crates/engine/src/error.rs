//! Error types for compiling, loading and running snippets.

use std::path::PathBuf;

use hypersnip_primitives::{ChangeError, DocId};
use hypersnip_script::ScriptError;
use thiserror::Error;

/// A definition source that could not be compiled.
///
/// Compilation is all-or-nothing per source: any of these rejects every
/// snippet of the file.
#[derive(Debug, Error)]
pub enum CompileError {
	/// A `snippet` line does not follow the header grammar.
	#[error("line {line}: invalid snippet header `{text}`")]
	InvalidHeader { line: usize, text: String },

	/// A `priority` directive without an integer argument.
	#[error("line {line}: invalid priority `{value}`")]
	InvalidPriority { line: usize, value: String },

	/// A pattern trigger that is not a valid regular expression.
	#[error("line {line}: invalid trigger pattern: {source}")]
	InvalidPattern {
		line: usize,
		#[source]
		source: Box<fancy_regex::Error>,
	},

	/// `global` without a matching `endglobal`.
	#[error("line {line}: `global` section is never closed")]
	UnterminatedGlobal { line: usize },

	/// A code block opened with the block delimiter is never closed.
	#[error("line {line}: code block is never closed")]
	UnterminatedBlock { line: usize },

	/// A snippet without `endsnippet`.
	#[error("line {line}: snippet is missing `endsnippet`")]
	UnterminatedSnippet { line: usize },

	/// Block or preamble code that fails to parse.
	#[error("line {line}: {source}")]
	Script {
		line: usize,
		#[source]
		source: ScriptError,
	},
}

/// Failures reading definition text from a [`DefinitionSource`](crate::DefinitionSource).
#[derive(Debug, Error)]
pub enum SourceError {
	/// Error reading a definition file or directory.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The source has no definitions for the requested scope.
	#[error("unknown definition scope `{0}`")]
	UnknownScope(String),
}

/// Why one scope failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error(transparent)]
	Source(#[from] SourceError),
	#[error(transparent)]
	Compile(#[from] CompileError),
}

/// Errors reported by an [`EditorHost`](crate::EditorHost).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
	#[error("{0} is not open")]
	UnknownDocument(DocId),

	#[error("range {start}..{end} is out of bounds for {doc} ({len} chars)")]
	OutOfBounds { doc: DocId, start: usize, end: usize, len: usize },

	#[error("{0}")]
	Other(String),
}

/// Errors surfaced by [`SnippetEngine`](crate::SnippetEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// A generator failed; nothing was inserted.
	#[error("snippet generator failed: {0}")]
	Script(#[from] ScriptError),

	#[error("host error: {0}")]
	Host(#[from] HostError),

	#[error("invalid document change: {0}")]
	Change(#[from] ChangeError),

	#[error(transparent)]
	Source(#[from] SourceError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
