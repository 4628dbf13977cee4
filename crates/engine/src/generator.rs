//! Block evaluation for one snippet.
//!
//! A generator run builds a fresh interpreter, runs the shared preamble, binds
//! the match context `m` and placeholder texts `t`, then runs each block with
//! the running value `rv` reset to the empty string. The block's value is
//! `String(rv)` once its code finishes. All blocks of a run share one scope.

use std::sync::Arc;

use hypersnip_script::{Interpreter, Program, Result, ScriptError, ScriptLimits, Value};

use crate::snippet::Segment;

#[cfg(test)]
mod tests;

/// Values produced by one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionOutput {
	pub segments: Vec<Segment>,
	/// One value per block, in block order.
	pub block_values: Vec<String>,
}

/// Result of re-running a generator after a placeholder edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Rerun {
	pub output: ExpansionOutput,
	/// Blocks that failed, with their error. Each kept its previous value.
	pub failures: Vec<(usize, ScriptError)>,
}

/// The compiled body of a snippet.
#[derive(Debug, Clone)]
pub struct Generator {
	preamble: Arc<Program>,
	segments: Vec<Segment>,
	blocks: Vec<Program>,
}

impl Generator {
	pub(crate) fn new(preamble: Arc<Program>, segments: Vec<Segment>, blocks: Vec<Program>) -> Self {
		Self { preamble, segments, blocks }
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn block_count(&self) -> usize {
		self.blocks.len()
	}

	/// Runs every block for a fresh expansion; `t` grows as blocks finish.
	///
	/// The first failing block fails the whole run.
	pub fn run(&self, captures: &[Option<String>], limits: &ScriptLimits) -> Result<ExpansionOutput> {
		let mut interp = Interpreter::new(*limits);
		let env = self.prepare(&mut interp, captures, &[])?;
		let mut block_values = Vec::with_capacity(self.blocks.len());
		for (idx, block) in self.blocks.iter().enumerate() {
			let value = env.run_block(&mut interp, block)?;
			env.record(idx, &value, 0);
			block_values.push(value);
		}
		Ok(self.output(block_values))
	}

	/// Re-runs every block after the placeholder of block `live.len() - 1`
	/// was edited.
	///
	/// `live` holds the current placeholder texts of blocks `0..live.len()`;
	/// they stay in `t` unchanged while later entries are replaced by the
	/// freshly computed values. A failing block keeps its value from
	/// `previous` and the remaining blocks still run. Only a failing
	/// preamble fails the whole rerun.
	pub fn rerun(&self, captures: &[Option<String>], live: &[String], previous: &[String], limits: &ScriptLimits) -> Result<Rerun> {
		let mut interp = Interpreter::new(*limits);
		let env = self.prepare(&mut interp, captures, live)?;
		let mut block_values = Vec::with_capacity(self.blocks.len());
		let mut failures = Vec::new();
		for (idx, block) in self.blocks.iter().enumerate() {
			let value = match env.run_block(&mut interp, block) {
				Ok(value) => value,
				Err(error) => {
					failures.push((idx, error));
					previous.get(idx).cloned().unwrap_or_default()
				}
			};
			env.record(idx, &value, live.len());
			block_values.push(value);
		}
		Ok(Rerun {
			output: self.output(block_values),
			failures,
		})
	}

	fn prepare(&self, interp: &mut Interpreter, captures: &[Option<String>], live: &[String]) -> Result<Env> {
		let scope = interp.scope();
		interp.run(&self.preamble, &scope)?;

		let placeholders = Value::string_array(live.iter().map(Some));
		scope.declare("m", Value::string_array(captures.iter().map(Option::as_deref)));
		scope.declare("t", placeholders.clone());
		Ok(Env { scope, placeholders })
	}

	fn output(&self, block_values: Vec<String>) -> ExpansionOutput {
		ExpansionOutput {
			segments: self.segments.clone(),
			block_values,
		}
	}
}

/// Scope shared by the blocks of one run, and its `t` array.
struct Env {
	scope: hypersnip_script::Scope,
	placeholders: Value,
}

impl Env {
	fn run_block(&self, interp: &mut Interpreter, block: &Program) -> Result<String> {
		self.scope.declare("rv", Value::str(""));
		interp.run(block, &self.scope)?;
		Ok(self.scope.get("rv").unwrap_or_default().to_display_string())
	}

	/// Stores the value of block `idx` in `t` unless it is one of the first
	/// `keep` live entries.
	fn record(&self, idx: usize, value: &str, keep: usize) {
		if idx < keep {
			return;
		}
		if let Value::Array(items) = &self.placeholders {
			let mut items = items.borrow_mut();
			if items.len() <= idx {
				items.resize(idx + 1, Value::Undefined);
			}
			items[idx] = Value::str(value);
		}
	}
}
