//! Tree-walking evaluator.
//!
//! # Budget
//!
//! Every statement, loop iteration and function call consumes one step from
//! [`ScriptLimits::max_steps`]. Call nesting is capped at
//! [`ScriptLimits::max_depth`] frames. Strings and arrays are checked against
//! their size caps whenever an operation produces a new value.
//!
//! # Scopes
//!
//! Scopes are reference counted frames chained to their parent. Closures keep
//! their defining frame alive, so frames can form cycles; the interpreter
//! records every frame it creates and empties them on drop.

mod builtins;

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, LogicalOp, Program, Stmt, TemplateSegment, UnaryOp};
use crate::error::{Result, ScriptError};
use crate::limits::ScriptLimits;
use crate::value::{Closure, Namespace, Native, Value};


struct Binding {
	value: Value,
	mutable: bool,
}

#[derive(Default)]
struct Frame {
	vars: FxHashMap<String, Binding>,
	parent: Option<Scope>,
}

/// A lexical environment frame.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
	fn with_parent(parent: &Scope) -> Self {
		Self(Rc::new(RefCell::new(Frame {
			vars: FxHashMap::default(),
			parent: Some(parent.clone()),
		})))
	}

	/// Declares (or redeclares) a mutable binding in this frame.
	pub fn declare(&self, name: impl Into<String>, value: Value) {
		self.declare_with(name, value, true);
	}

	fn declare_with(&self, name: impl Into<String>, value: Value, mutable: bool) {
		self.0.borrow_mut().vars.insert(name.into(), Binding { value, mutable });
	}

	/// Looks `name` up through the parent chain.
	pub fn get(&self, name: &str) -> Option<Value> {
		let mut frame = self.clone();
		loop {
			let parent = {
				let data = frame.0.borrow();
				if let Some(binding) = data.vars.get(name) {
					return Some(binding.value.clone());
				}
				data.parent.clone()?
			};
			frame = parent;
		}
	}

	/// Assigns to an existing binding, or creates a global one when none exists.
	fn assign(&self, name: &str, value: Value) -> Result<()> {
		let mut frame = self.clone();
		loop {
			let parent = {
				let mut data = frame.0.borrow_mut();
				if let Some(binding) = data.vars.get_mut(name) {
					if !binding.mutable {
						return Err(ScriptError::Type(format!("assignment to constant variable `{name}`")));
					}
					binding.value = value;
					return Ok(());
				}
				data.parent.clone()
			};
			match parent {
				Some(parent) => frame = parent,
				None => {
					frame.declare(name, value);
					return Ok(());
				}
			}
		}
	}

	fn is_declared(&self, name: &str) -> bool {
		self.get(name).is_some()
	}
}

enum Flow {
	Normal,
	Return(Value),
	Break,
	Continue,
}

/// Evaluates programs under a fixed resource budget.
///
/// One interpreter corresponds to one generator run: the step budget is never
/// replenished.
pub struct Interpreter {
	limits: ScriptLimits,
	steps: u64,
	depth: usize,
	globals: Scope,
	frames: Vec<Scope>,
}

impl Interpreter {
	pub fn new(limits: ScriptLimits) -> Self {
		let globals = Scope::default();
		for (name, native) in [
			("String", Native::String),
			("Number", Native::Number),
			("parseInt", Native::ParseInt),
			("parseFloat", Native::ParseFloat),
			("isNaN", Native::IsNaN),
			("now", Native::Now),
		] {
			globals.declare_with(name, Value::Native(native), false);
		}
		globals.declare_with("Math", Value::Namespace(Namespace::Math), false);
		globals.declare_with("console", Value::Namespace(Namespace::Console), false);
		globals.declare_with("NaN", Value::Number(f64::NAN), false);
		globals.declare_with("Infinity", Value::Number(f64::INFINITY), false);

		Self {
			limits,
			steps: 0,
			depth: 0,
			globals,
			frames: Vec::new(),
		}
	}

	pub fn limits(&self) -> &ScriptLimits {
		&self.limits
	}

	/// Steps consumed so far.
	pub fn steps(&self) -> u64 {
		self.steps
	}

	/// Creates a fresh top-level scope whose parent holds the builtins.
	pub fn scope(&mut self) -> Scope {
		let globals = self.globals.clone();
		self.child(&globals)
	}

	/// Runs `program` directly in `scope`.
	///
	/// Declarations land in `scope`, so consecutive runs against the same scope
	/// see each other's bindings.
	pub fn run(&mut self, program: &Program, scope: &Scope) -> Result<()> {
		match self.exec_block(&program.body, scope)? {
			Flow::Normal => Ok(()),
			Flow::Return(_) => Err(ScriptError::Runtime("`return` outside of a function".into())),
			Flow::Break | Flow::Continue => Err(ScriptError::Runtime("`break` or `continue` outside of a loop".into())),
		}
	}

	/// Evaluates a single expression in `scope`.
	pub fn eval_expression(&mut self, expr: &Expr, scope: &Scope) -> Result<Value> {
		self.eval(expr, scope)
	}

	fn child(&mut self, parent: &Scope) -> Scope {
		let scope = Scope::with_parent(parent);
		self.frames.push(scope.clone());
		scope
	}

	fn tick(&mut self) -> Result<()> {
		self.steps += 1;
		if self.steps > self.limits.max_steps {
			return Err(ScriptError::StepLimit(self.limits.max_steps));
		}
		Ok(())
	}

	pub(crate) fn check_string(&self, s: String) -> Result<Value> {
		if s.len() > self.limits.max_string_len && s.chars().count() > self.limits.max_string_len {
			return Err(ScriptError::SizeLimit(format!("string longer than {} chars", self.limits.max_string_len)));
		}
		Ok(Value::from(s))
	}

	pub(crate) fn check_array_len(&self, len: usize) -> Result<()> {
		if len > self.limits.max_array_len {
			return Err(ScriptError::SizeLimit(format!("array longer than {} elements", self.limits.max_array_len)));
		}
		Ok(())
	}

	fn hoist(&mut self, stmts: &[Stmt], scope: &Scope) {
		for stmt in stmts {
			if let Stmt::Function(def) = stmt
				&& let Some(name) = &def.name
			{
				let closure = Closure {
					def: def.clone(),
					scope: scope.clone(),
				};
				scope.declare(name.clone(), Value::Function(Rc::new(closure)));
			}
		}
	}

	fn exec_block(&mut self, stmts: &[Stmt], scope: &Scope) -> Result<Flow> {
		self.hoist(stmts, scope);
		for stmt in stmts {
			let flow = self.exec(stmt, scope)?;
			if !matches!(flow, Flow::Normal) {
				return Ok(flow);
			}
		}
		Ok(Flow::Normal)
	}

	/// Runs a loop body, translating its flow into "keep going" or an exit.
	fn loop_body(&mut self, body: &Stmt, scope: &Scope) -> Result<Option<Flow>> {
		Ok(match self.exec(body, scope)? {
			Flow::Normal | Flow::Continue => None,
			Flow::Break => Some(Flow::Normal),
			ret @ Flow::Return(_) => Some(ret),
		})
	}

	fn exec(&mut self, stmt: &Stmt, scope: &Scope) -> Result<Flow> {
		self.tick()?;
		match stmt {
			Stmt::Decl { kind, decls } => {
				for decl in decls {
					let value = match &decl.init {
						Some(init) => self.eval(init, scope)?,
						None => Value::Undefined,
					};
					scope.declare_with(decl.name.clone(), value, *kind != DeclKind::Const);
				}
			}
			Stmt::Expr(expr) => {
				self.eval(expr, scope)?;
			}
			Stmt::If { cond, then, otherwise } => {
				if self.eval(cond, scope)?.truthy() {
					return self.exec(then, scope);
				}
				if let Some(otherwise) = otherwise {
					return self.exec(otherwise, scope);
				}
			}
			Stmt::While { cond, body } => {
				while self.eval(cond, scope)?.truthy() {
					if let Some(exit) = self.loop_body(body, scope)? {
						return Ok(exit);
					}
					self.tick()?;
				}
			}
			Stmt::For { init, cond, update, body } => {
				let scope = self.child(scope);
				if let Some(init) = init {
					self.exec(init, &scope)?;
				}
				loop {
					if let Some(cond) = cond
						&& !self.eval(cond, &scope)?.truthy()
					{
						break;
					}
					if let Some(exit) = self.loop_body(body, &scope)? {
						return Ok(exit);
					}
					if let Some(update) = update {
						self.eval(update, &scope)?;
					}
					self.tick()?;
				}
			}
			Stmt::ForOf { kind, name, iter, body } => {
				let items = match self.eval(iter, scope)? {
					Value::Array(items) => items.borrow().clone(),
					Value::Str(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
					other => return Err(ScriptError::Type(format!("{} is not iterable", other.type_name()))),
				};
				for item in items {
					let scope = self.child(scope);
					scope.declare_with(name.clone(), item, *kind != DeclKind::Const);
					if let Some(exit) = self.loop_body(body, &scope)? {
						return Ok(exit);
					}
					self.tick()?;
				}
			}
			Stmt::Block(stmts) => {
				let scope = self.child(scope);
				return self.exec_block(stmts, &scope);
			}
			Stmt::Function(def) => {
				if !def.name.as_ref().is_some_and(|name| scope.0.borrow().vars.contains_key(name)) {
					self.hoist(std::slice::from_ref(stmt), scope);
				}
			}
			Stmt::Return(value) => {
				let value = match value {
					Some(expr) => self.eval(expr, scope)?,
					None => Value::Undefined,
				};
				return Ok(Flow::Return(value));
			}
			Stmt::Break => return Ok(Flow::Break),
			Stmt::Continue => return Ok(Flow::Continue),
			Stmt::Empty => {}
		}
		Ok(Flow::Normal)
	}

	fn eval(&mut self, expr: &Expr, scope: &Scope) -> Result<Value> {
		match expr {
			Expr::Number(n) => Ok(Value::Number(*n)),
			Expr::Str(s) => Ok(Value::str(s)),
			Expr::Bool(b) => Ok(Value::Bool(*b)),
			Expr::Null => Ok(Value::Null),
			Expr::Undefined => Ok(Value::Undefined),
			Expr::Template(segments) => {
				let mut out = String::new();
				for segment in segments {
					match segment {
						TemplateSegment::Text(text) => out.push_str(text),
						TemplateSegment::Expr(expr) => out.push_str(&self.eval(expr, scope)?.to_display_string()),
					}
				}
				self.check_string(out)
			}
			Expr::Array(items) => {
				self.check_array_len(items.len())?;
				let mut values = Vec::with_capacity(items.len());
				for item in items {
					values.push(self.eval(item, scope)?);
				}
				Ok(Value::array(values))
			}
			Expr::Ident(name) => scope.get(name).ok_or_else(|| ScriptError::Undefined(name.clone())),
			Expr::Unary { op: UnaryOp::Typeof, expr } => {
				if let Expr::Ident(name) = expr.as_ref()
					&& !scope.is_declared(name)
				{
					return Ok(Value::str("undefined"));
				}
				Ok(Value::str(self.eval(expr, scope)?.type_name()))
			}
			Expr::Unary { op, expr } => {
				let value = self.eval(expr, scope)?;
				Ok(match op {
					UnaryOp::Not => Value::Bool(!value.truthy()),
					UnaryOp::Neg => Value::Number(-value.to_number()),
					_ => Value::Number(value.to_number()),
				})
			}
			Expr::Binary { op, lhs, rhs } => {
				let lhs = self.eval(lhs, scope)?;
				let rhs = self.eval(rhs, scope)?;
				self.binary(*op, &lhs, &rhs)
			}
			Expr::Logical { op, lhs, rhs } => {
				let lhs = self.eval(lhs, scope)?;
				let short_circuit = match op {
					LogicalOp::And => !lhs.truthy(),
					LogicalOp::Or => lhs.truthy(),
					LogicalOp::Nullish => !lhs.is_nullish(),
				};
				if short_circuit { Ok(lhs) } else { self.eval(rhs, scope) }
			}
			Expr::Conditional { cond, then, otherwise } => {
				if self.eval(cond, scope)?.truthy() {
					self.eval(then, scope)
				} else {
					self.eval(otherwise, scope)
				}
			}
			Expr::Assign { op, target, value } => {
				let value = match op {
					AssignOp(None) => self.eval(value, scope)?,
					AssignOp(Some(op)) => {
						let current = self.eval(target, scope)?;
						let rhs = self.eval(value, scope)?;
						self.binary(*op, &current, &rhs)?
					}
				};
				self.assign(target, value.clone(), scope)?;
				Ok(value)
			}
			Expr::Update { target, increment, prefix } => {
				let old = self.eval(target, scope)?.to_number();
				let new = if *increment { old + 1.0 } else { old - 1.0 };
				self.assign(target, Value::Number(new), scope)?;
				Ok(Value::Number(if *prefix { new } else { old }))
			}
			Expr::Member { object, property } => {
				let object = self.eval(object, scope)?;
				builtins::property(&object, property)
			}
			Expr::Index { object, index } => {
				let object = self.eval(object, scope)?;
				let index = self.eval(index, scope)?;
				index_value(&object, &index)
			}
			Expr::Call { callee, args } => {
				let mut values = Vec::with_capacity(args.len());
				if let Expr::Member { object, property } = callee.as_ref() {
					let receiver = self.eval(object, scope)?;
					for arg in args {
						values.push(self.eval(arg, scope)?);
					}
					return self.call_method(receiver, property, values);
				}
				let callee = self.eval(callee, scope)?;
				for arg in args {
					values.push(self.eval(arg, scope)?);
				}
				self.call(&callee, values)
			}
			Expr::Function(def) => Ok(Value::Function(Rc::new(Closure {
				def: def.clone(),
				scope: scope.clone(),
			}))),
		}
	}

	fn binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
		let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(lhs.to_number(), rhs.to_number()));
		Ok(match op {
			BinaryOp::Add => {
				let stringy = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_) | Value::Function(_) | Value::Native(_) | Value::Namespace(_));
				if stringy(lhs) || stringy(rhs) {
					let mut out = lhs.to_display_string();
					out.push_str(&rhs.to_display_string());
					return self.check_string(out);
				}
				numeric(|a, b| a + b)
			}
			BinaryOp::Sub => numeric(|a, b| a - b),
			BinaryOp::Mul => numeric(|a, b| a * b),
			BinaryOp::Div => numeric(|a, b| a / b),
			BinaryOp::Rem => numeric(|a, b| a % b),
			BinaryOp::Eq => Value::Bool(lhs.loose_eq(rhs)),
			BinaryOp::NotEq => Value::Bool(!lhs.loose_eq(rhs)),
			BinaryOp::StrictEq => Value::Bool(lhs.strict_eq(rhs)),
			BinaryOp::StrictNotEq => Value::Bool(!lhs.strict_eq(rhs)),
			BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
				let ordering = match (lhs, rhs) {
					(Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
					_ => lhs.to_number().partial_cmp(&rhs.to_number()),
				};
				Value::Bool(ordering.is_some_and(|ord| match op {
					BinaryOp::Lt => ord.is_lt(),
					BinaryOp::LtEq => ord.is_le(),
					BinaryOp::Gt => ord.is_gt(),
					_ => ord.is_ge(),
				}))
			}
		})
	}

	fn assign(&mut self, target: &Expr, value: Value, scope: &Scope) -> Result<()> {
		match target {
			Expr::Ident(name) => scope.assign(name, value),
			Expr::Index { object, index } => {
				let object = self.eval(object, scope)?;
				let index = self.eval(index, scope)?;
				match object {
					Value::Array(items) => {
						let Some(idx) = array_index(&index) else {
							return Err(ScriptError::Type(format!("invalid array index {}", index.to_display_string())));
						};
						self.check_array_len(idx + 1)?;
						let mut items = items.borrow_mut();
						if idx >= items.len() {
							items.resize(idx + 1, Value::Undefined);
						}
						items[idx] = value;
						Ok(())
					}
					// Strings are immutable; writes are silently dropped.
					Value::Str(_) => Ok(()),
					other => Err(ScriptError::Type(format!("cannot set index on {}", other.type_name()))),
				}
			}
			_ => Err(ScriptError::Runtime("invalid assignment target".into())),
		}
	}

	/// Calls a function value with already evaluated arguments.
	pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
		match callee {
			Value::Function(closure) => {
				self.tick()?;
				if self.depth >= self.limits.max_depth {
					return Err(ScriptError::DepthLimit(self.limits.max_depth));
				}
				self.depth += 1;
				let result = self.invoke(closure, args);
				self.depth -= 1;
				result
			}
			Value::Native(native) => self.call_native(*native, args),
			other => Err(ScriptError::Type(format!("{} is not a function", other.to_display_string()))),
		}
	}

	fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value> {
		let scope = self.child(&closure.scope);
		let mut args = args.into_iter();
		for param in &closure.def.params {
			scope.declare(param.clone(), args.next().unwrap_or_default());
		}
		match &closure.def.body {
			FunctionBody::Expr(expr) => self.eval(expr, &scope),
			FunctionBody::Block(stmts) => match self.exec_block(stmts, &scope)? {
				Flow::Return(value) => Ok(value),
				Flow::Normal => Ok(Value::Undefined),
				Flow::Break | Flow::Continue => Err(ScriptError::Runtime("`break` or `continue` outside of a loop".into())),
			},
		}
	}
}

impl Drop for Interpreter {
	fn drop(&mut self) {
		for frame in self.frames.drain(..) {
			frame.0.borrow_mut().vars.clear();
		}
	}
}

/// Converts an index value to an array position, rejecting negatives and fractions.
fn array_index(index: &Value) -> Option<usize> {
	let n = index.to_number();
	(n >= 0.0 && n.fract() == 0.0 && n.is_finite()).then_some(n as usize)
}

fn index_value(object: &Value, index: &Value) -> Result<Value> {
	match object {
		Value::Array(items) => match array_index(index) {
			Some(idx) => Ok(items.borrow().get(idx).cloned().unwrap_or_default()),
			None => builtins::property(object, &index.to_display_string()),
		},
		Value::Str(s) => match array_index(index) {
			Some(idx) => Ok(s.chars().nth(idx).map_or(Value::Undefined, |c| Value::from(c.to_string()))),
			None => builtins::property(object, &index.to_display_string()),
		},
		other => builtins::property(other, &index.to_display_string()),
	}
}
