//! Engine configuration.
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! keystroke-only = true
//! context-chars = 4096
//!
//! [priority]
//! pattern-bonus = 0
//!
//! [script]
//! max-steps = 100000
//! max-depth = 64
//! max-string-len = 1048576
//! max-array-len = 10000
//! ```

use std::path::{Path, PathBuf};

use hypersnip_script::ScriptLimits;
use serde::Deserialize;
use thiserror::Error;


/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an invalid value.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
	/// Only single-character insertions are treated as keystrokes that may
	/// auto-expand a snippet. When false any insertion runs the matcher.
	pub keystroke_only: bool,
	/// How many chars before the cursor the matcher looks at.
	pub context_chars: usize,
	pub priority: PriorityPolicy,
	pub script: ScriptLimits,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			keystroke_only: true,
			context_chars: 4096,
			priority: PriorityPolicy::default(),
			script: ScriptLimits::default(),
		}
	}
}

/// How the effective sort priority of a snippet is derived.
///
/// The effective priority is the snippet's explicit `priority` directive
/// value, plus `pattern_bonus` for pattern triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PriorityPolicy {
	pub pattern_bonus: i32,
}

impl EngineConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}
}
