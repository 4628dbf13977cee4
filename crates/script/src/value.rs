//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDef;
use crate::interp::Scope;

/// A function value together with the scope it closes over.
pub struct Closure {
	pub def: std::sync::Arc<FunctionDef>,
	pub scope: Scope,
}

/// Host-provided global functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
	String,
	Number,
	ParseInt,
	ParseFloat,
	IsNaN,
	Now,
}

/// Builtin namespaces reachable through member access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
	Math,
	Console,
}

/// Array nesting printed before the rest is elided.
pub const MAX_PRINT_DEPTH: usize = 256;

#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	Str(Rc<str>),
	Array(Rc<RefCell<Vec<Value>>>),
	Function(Rc<Closure>),
	Native(Native),
	Namespace(Namespace),
}

impl Value {
	pub fn str(s: impl AsRef<str>) -> Self {
		Self::Str(Rc::from(s.as_ref()))
	}

	pub fn array(items: Vec<Value>) -> Self {
		Self::Array(Rc::new(RefCell::new(items)))
	}

	/// Builds an array of strings, `None` entries becoming `undefined`.
	pub fn string_array<I, S>(items: I) -> Self
	where
		I: IntoIterator<Item = Option<S>>,
		S: AsRef<str>,
	{
		Self::array(items.into_iter().map(|item| item.map_or(Self::Undefined, Self::str)).collect())
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null => "object",
			Self::Bool(_) => "boolean",
			Self::Number(_) => "number",
			Self::Str(_) => "string",
			Self::Array(_) => "object",
			Self::Function(_) | Self::Native(_) => "function",
			Self::Namespace(_) => "object",
		}
	}

	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	pub fn truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => *n != 0.0 && !n.is_nan(),
			Self::Str(s) => !s.is_empty(),
			_ => true,
		}
	}

	pub fn to_number(&self) -> f64 {
		match self {
			Self::Undefined => f64::NAN,
			Self::Null => 0.0,
			Self::Bool(b) => f64::from(u8::from(*b)),
			Self::Number(n) => *n,
			Self::Str(s) => parse_numeric_string(s),
			Self::Array(_) => parse_numeric_string(&self.to_display_string()),
			_ => f64::NAN,
		}
	}

	/// String conversion with JavaScript rules (`String(value)`).
	///
	/// An array reached again while it is being printed renders as `""`, and
	/// so does anything nested deeper than [`MAX_PRINT_DEPTH`].
	pub fn to_display_string(&self) -> String {
		let mut out = String::new();
		self.write_display(&mut out, &mut Vec::new());
		out
	}

	fn write_display(&self, out: &mut String, open: &mut Vec<*const RefCell<Vec<Value>>>) {
		match self {
			Self::Undefined => out.push_str("undefined"),
			Self::Null => out.push_str("null"),
			Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
			Self::Number(n) => out.push_str(&format_number(*n)),
			Self::Str(s) => out.push_str(s),
			Self::Array(items) => write_joined(items, ",", out, open),
			Self::Function(closure) => out.push_str(&format!("function {}() {{ [code] }}", closure.def.name.as_deref().unwrap_or(""))),
			Self::Native(native) => out.push_str(&format!("function {native:?}() {{ [native code] }}")),
			Self::Namespace(ns) => out.push_str(&format!("[object {ns:?}]")),
		}
	}

	/// `===` comparison.
	pub fn strict_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
			(Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
			(Self::Native(a), Self::Native(b)) => a == b,
			(Self::Namespace(a), Self::Namespace(b)) => a == b,
			_ => false,
		}
	}

	/// `==` comparison with the usual primitive coercions.
	pub fn loose_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
			(Self::Number(_), Self::Str(_)) | (Self::Str(_), Self::Number(_)) | (Self::Bool(_), _) | (_, Self::Bool(_)) => {
				let (a, b) = (self.to_number(), other.to_number());
				a == b
			}
			(Self::Array(_), Self::Str(_)) | (Self::Str(_), Self::Array(_)) => self.to_display_string() == other.to_display_string(),
			_ => self.strict_eq(other),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.write_debug(f, &mut Vec::new())
	}
}

impl Value {
	fn write_debug(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const RefCell<Vec<Value>>>) -> fmt::Result {
		match self {
			Self::Str(s) => write!(f, "{s:?}"),
			Self::Array(items) => {
				let ptr = Rc::as_ptr(items);
				if open.contains(&ptr) || open.len() >= MAX_PRINT_DEPTH {
					return f.write_str("[...]");
				}
				open.push(ptr);
				f.write_str("[")?;
				for (i, item) in items.borrow().iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					item.write_debug(f, open)?;
				}
				open.pop();
				f.write_str("]")
			}
			other => f.write_str(&other.to_display_string()),
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::str(s)
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(Rc::from(s))
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

/// `Array.prototype.join`: nullish elements print empty, as do arrays
/// already being joined.
pub fn join_array(items: &Rc<RefCell<Vec<Value>>>, sep: &str) -> String {
	let mut out = String::new();
	write_joined(items, sep, &mut out, &mut Vec::new());
	out
}

fn write_joined(items: &Rc<RefCell<Vec<Value>>>, sep: &str, out: &mut String, open: &mut Vec<*const RefCell<Vec<Value>>>) {
	let ptr = Rc::as_ptr(items);
	if open.contains(&ptr) || open.len() >= MAX_PRINT_DEPTH {
		return;
	}
	open.push(ptr);
	for (i, item) in items.borrow().iter().enumerate() {
		if i > 0 {
			out.push_str(sep);
		}
		if !item.is_nullish() {
			item.write_display(out, open);
		}
	}
	open.pop();
}

/// Formats a number the way JavaScript's `String(n)` prints it.
pub fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".into()
	} else if n.is_infinite() {
		if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
	} else if n == 0.0 {
		"0".into()
	} else if (1e-6..1e21).contains(&n.abs()) {
		format!("{n}")
	} else {
		// `1e21` becomes `1e+21`, as JavaScript prints it.
		let exp = format!("{n:e}");
		match exp.split_once('e') {
			Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
			_ => exp,
		}
	}
}

fn parse_numeric_string(s: &str) -> f64 {
	let trimmed = s.trim();
	if trimmed.is_empty() {
		return 0.0;
	}
	if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
		return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
	}
	match trimmed {
		"Infinity" | "+Infinity" => f64::INFINITY,
		"-Infinity" => f64::NEG_INFINITY,
		_ if trimmed.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) => trimmed.parse().unwrap_or(f64::NAN),
		_ => f64::NAN,
	}
}
