use serde::Deserialize;

/// Resource caps applied to one interpreter run.
///
/// A generator run (preamble plus every block of one snippet) shares a single
/// budget, so a runaway loop in one block cannot stall the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScriptLimits {
	/// Maximum number of evaluation steps (statements, loop iterations, calls).
	pub max_steps: u64,
	/// Maximum nesting of function calls.
	pub max_depth: usize,
	/// Maximum length of any string value, in chars.
	pub max_string_len: usize,
	/// Maximum number of elements in any array value.
	pub max_array_len: usize,
}

impl Default for ScriptLimits {
	fn default() -> Self {
		Self {
			max_steps: 100_000,
			max_depth: 64,
			max_string_len: 1 << 20,
			max_array_len: 10_000,
		}
	}
}
