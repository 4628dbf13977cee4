//! Programmable snippets for text editors.
//!
//! Snippet definitions are written in a small line-based format:
//!
//! ```text
//! snippet `(\d+)x` "times" i
//! ``rv = m[1]`` time``rv = t[0] == '1' ? '' : 's'``
//! endsnippet
//! ```
//!
//! Each block between double backticks is script code whose final `rv` value
//! becomes an editable placeholder.
//!
//! Header flags: `i` expands inside words, `m` only in math contexts, `b`
//! only at the start of a line, and `M` matches patterns across lines. The
//! `A` flag of older definition files is accepted but changes nothing, since
//! every complete trigger expands as soon as it is typed.
//!
//! The crate is split into:
//!
//! - **Compiler**: definition text to [`SnippetDefinition`]s
//! - **Registry**: per-language snippet lists merged with the `all` scope
//! - **Matcher**: decides on each keystroke whether a trigger auto-expands
//! - **Synthesizer**: runs a generator and builds the editor template
//! - **Runtime**: [`SnippetEngine`], which tracks live expansions and keeps
//!   dependent placeholders up to date while the user edits
//!
//! The editor is reached only through the [`EditorHost`] trait.

mod compiler;
pub mod config;
mod error;
mod generator;
mod host;
pub mod matcher;
pub mod registry;
mod runtime;
mod snippet;
pub mod synth;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use compiler::compile;
pub use config::{ConfigError, EngineConfig, PriorityPolicy};
pub use error::{CompileError, EngineError, HostError, LoadError, Result, SourceError};
pub use generator::{ExpansionOutput, Generator, Rerun};
pub use host::{Direction, EditorHost};
pub use hypersnip_primitives::{Change, CharIdx, DocId};
pub use hypersnip_script::{ScriptError, ScriptLimits};
pub use matcher::{AutoExpand, Candidate, MatchInput, MatchResult, find_match};
pub use registry::{CompiledLanguageSet, DefinitionSource, DirSource, GLOBAL_SCOPE, LoadReport, MemorySource};
pub use runtime::{ChangeReport, DocumentChange, InstanceStack, LivePlaceholder, NavOutcome, SnippetEngine, SnippetInstance};
pub use snippet::{Segment, SnippetDefinition, SnippetFlags, Trigger};
pub use synth::{Expansion, Placeholder, synthesize};
