//! Error types for parsing and evaluating block code.

use thiserror::Error;

/// Errors raised by the lexer, parser, or interpreter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
	/// Source text could not be tokenized or parsed.
	#[error("syntax error at {line}:{col}: {message}")]
	Syntax {
		/// 1-based line within the parsed source.
		line: u32,
		/// 1-based column within the line.
		col: u32,
		/// What the parser expected or found.
		message: String,
	},

	/// A name was read before it was declared.
	#[error("{0} is not defined")]
	Undefined(String),

	/// An operation was applied to a value of the wrong kind.
	#[error("type error: {0}")]
	Type(String),

	/// Any other evaluation failure.
	#[error("runtime error: {0}")]
	Runtime(String),

	/// The evaluation step budget was exhausted.
	#[error("step limit of {0} exceeded")]
	StepLimit(u64),

	/// Function calls nested deeper than allowed.
	#[error("call depth limit of {0} exceeded")]
	DepthLimit(usize),

	/// A string or array grew past its size cap.
	#[error("size limit exceeded: {0}")]
	SizeLimit(String),
}

impl ScriptError {
	pub(crate) fn syntax(line: u32, col: u32, message: impl Into<String>) -> Self {
		Self::Syntax {
			line,
			col,
			message: message.into(),
		}
	}

	/// Returns true for errors raised before evaluation started.
	pub fn is_syntax(&self) -> bool {
		matches!(self, Self::Syntax { .. })
	}
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;
