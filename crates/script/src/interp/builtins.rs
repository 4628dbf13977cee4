//! Builtin properties, methods and global functions.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use chrono::format::{Item, StrftimeItems};

use super::Interpreter;
use crate::error::{Result, ScriptError};
use crate::value::{Namespace, Native, Value, format_number, join_array};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

fn arg(args: &[Value], idx: usize) -> Value {
	args.get(idx).cloned().unwrap_or_default()
}

fn nullish_access(object: &Value, name: &str) -> ScriptError {
	ScriptError::Type(format!("cannot read properties of {} (reading '{name}')", object.to_display_string()))
}

/// Resolves `object.name` outside of a call.
pub(super) fn property(object: &Value, name: &str) -> Result<Value> {
	Ok(match (object, name) {
		(Value::Undefined | Value::Null, _) => return Err(nullish_access(object, name)),
		(Value::Str(s), "length") => Value::Number(s.chars().count() as f64),
		(Value::Array(items), "length") => Value::Number(items.borrow().len() as f64),
		(Value::Namespace(Namespace::Math), "PI") => Value::Number(std::f64::consts::PI),
		(Value::Namespace(Namespace::Math), "E") => Value::Number(std::f64::consts::E),
		_ => Value::Undefined,
	})
}

/// Resolves a possibly negative index against `len`, clamping to `0..=len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
	if matches!(value, Value::Undefined) {
		return default;
	}
	let n = value.to_number();
	if n.is_nan() {
		return 0;
	}
	let n = n.trunc();
	if n < 0.0 {
		(len as f64 + n).max(0.0) as usize
	} else {
		(n as usize).min(len)
	}
}

/// Clamps an index to `0..=len`, treating negatives as zero.
fn clamped_index(value: &Value, len: usize, default: usize) -> usize {
	if matches!(value, Value::Undefined) {
		return default;
	}
	let n = value.to_number();
	if n.is_nan() || n <= 0.0 { 0 } else { (n as usize).min(len) }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
	s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn char_position(s: &str, byte: usize) -> usize {
	s[..byte].chars().count()
}

fn byte_offset(s: &str, chars: usize) -> usize {
	s.char_indices().nth(chars).map_or(s.len(), |(byte, _)| byte)
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
		_ => a.strict_eq(b),
	}
}

impl Interpreter {
	pub(super) fn call_method(&mut self, receiver: Value, name: &str, args: Vec<Value>) -> Result<Value> {
		match &receiver {
			Value::Undefined | Value::Null => Err(nullish_access(&receiver, name)),
			Value::Str(s) => self.string_method(s, name, args),
			Value::Array(items) => self.array_method(items, name, args),
			Value::Namespace(Namespace::Math) => math(name, &args),
			Value::Namespace(Namespace::Console) => {
				if !matches!(name, "log" | "debug" | "info" | "warn" | "error") {
					return Err(ScriptError::Type(format!("console.{name} is not a function")));
				}
				let line = args.iter().map(Value::to_display_string).collect::<Vec<_>>().join(" ");
				tracing::debug!(target: "hypersnip::script", method = name, "{line}");
				Ok(Value::Undefined)
			}
			Value::Number(n) => match name {
				"toFixed" => {
					let digits = arg(&args, 0).to_number();
					let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
					Ok(Value::from(format!("{n:.digits$}")))
				}
				"toString" => Ok(Value::from(format_number(*n))),
				_ => Err(ScriptError::Type(format!("number.{name} is not a function"))),
			},
			Value::Bool(_) if name == "toString" => Ok(Value::from(receiver.to_display_string())),
			other => Err(ScriptError::Type(format!("{}.{name} is not a function", other.type_name()))),
		}
	}

	pub(super) fn call_native(&mut self, native: Native, args: Vec<Value>) -> Result<Value> {
		Ok(match native {
			Native::String => match args.first() {
				Some(value) => self.check_string(value.to_display_string())?,
				None => Value::str(""),
			},
			Native::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
			Native::ParseInt => {
				let radix = arg(&args, 1).to_number();
				let radix = (radix.is_finite() && radix != 0.0).then_some(radix as u32);
				Value::Number(parse_int(&arg(&args, 0).to_display_string(), radix))
			}
			Native::ParseFloat => Value::Number(parse_float(&arg(&args, 0).to_display_string())),
			Native::IsNaN => Value::Bool(arg(&args, 0).to_number().is_nan()),
			Native::Now => {
				let format = match args.first() {
					Some(value) if !value.is_nullish() => value.to_display_string(),
					_ => DEFAULT_DATE_FORMAT.to_owned(),
				};
				if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
					return Err(ScriptError::Runtime(format!("invalid date format `{format}`")));
				}
				Value::from(Local::now().format(&format).to_string())
			}
		})
	}

	fn string_method(&mut self, s: &str, name: &str, args: Vec<Value>) -> Result<Value> {
		let len = || s.chars().count();
		let needle = || arg(&args, 0).to_display_string();
		Ok(match name {
			"toUpperCase" | "toLocaleUpperCase" => Value::from(s.to_uppercase()),
			"toLowerCase" | "toLocaleLowerCase" => Value::from(s.to_lowercase()),
			"trim" => Value::str(s.trim()),
			"trimStart" | "trimLeft" => Value::str(s.trim_start()),
			"trimEnd" | "trimRight" => Value::str(s.trim_end()),
			"toString" | "valueOf" => Value::str(s),
			"charAt" => {
				let idx = arg(&args, 0).to_number();
				let c = (idx >= 0.0).then(|| s.chars().nth(idx as usize)).flatten();
				Value::from(c.map(String::from).unwrap_or_default())
			}
			"charCodeAt" => {
				let idx = arg(&args, 0).to_number();
				let idx = if idx.is_nan() { 0.0 } else { idx };
				let c = (idx >= 0.0).then(|| s.chars().nth(idx as usize)).flatten();
				Value::Number(c.map_or(f64::NAN, |c| f64::from(u32::from(c))))
			}
			"at" => {
				let n = arg(&args, 0).to_number();
				let n = if n.is_nan() { 0.0 } else { n.trunc() };
				let idx = if n < 0.0 { len() as f64 + n } else { n };
				let c = (idx >= 0.0).then(|| s.chars().nth(idx as usize)).flatten();
				c.map_or(Value::Undefined, |c| Value::from(c.to_string()))
			}
			"indexOf" => {
				let from = byte_offset(s, clamped_index(&arg(&args, 1), len(), 0));
				let found = s[from..].find(&needle()).map(|byte| char_position(s, from + byte));
				Value::Number(found.map_or(-1.0, |idx| idx as f64))
			}
			"lastIndexOf" => Value::Number(s.rfind(&needle()).map_or(-1.0, |byte| char_position(s, byte) as f64)),
			"includes" => Value::Bool(s.contains(&needle())),
			"startsWith" => {
				let from = byte_offset(s, clamped_index(&arg(&args, 1), len(), 0));
				Value::Bool(s[from..].starts_with(&needle()))
			}
			"endsWith" => {
				let end = byte_offset(s, clamped_index(&arg(&args, 1), len(), len()));
				Value::Bool(s[..end].ends_with(&needle()))
			}
			"slice" => {
				let len = len();
				let start = relative_index(&arg(&args, 0), len, 0);
				let end = relative_index(&arg(&args, 1), len, len);
				Value::from(char_slice(s, start, end))
			}
			"substring" => {
				let len = len();
				let a = clamped_index(&arg(&args, 0), len, 0);
				let b = clamped_index(&arg(&args, 1), len, len);
				Value::from(char_slice(s, a.min(b), a.max(b)))
			}
			"substr" => {
				let len = len();
				let start = relative_index(&arg(&args, 0), len, 0);
				let count = clamped_index(&arg(&args, 1), len, len);
				Value::from(char_slice(s, start, start.saturating_add(count)))
			}
			"split" => {
				let sep = arg(&args, 0);
				let limit = match arg(&args, 1) {
					Value::Undefined => usize::MAX,
					limit => limit.to_number().max(0.0) as usize,
				};
				let parts: Vec<Value> = match sep {
					Value::Undefined => vec![Value::str(s)],
					sep => {
						let sep = sep.to_display_string();
						if sep.is_empty() {
							s.chars().take(limit).map(|c| Value::from(c.to_string())).collect()
						} else {
							s.split(sep.as_str()).take(limit).map(Value::str).collect()
						}
					}
				};
				self.check_array_len(parts.len())?;
				Value::array(parts)
			}
			"replace" | "replaceAll" => {
				let pattern = needle();
				let replacement = arg(&args, 1);
				let all = name == "replaceAll";
				let mut out = String::with_capacity(s.len());
				let mut rest = s;
				let mut first = true;
				while let Some(byte) = rest.find(&pattern)
					&& (all || first)
				{
					first = false;
					out.push_str(&rest[..byte]);
					let with = match &replacement {
						Value::Function(_) | Value::Native(_) => self.call(&replacement, vec![Value::str(&pattern)])?,
						other => other.clone(),
					};
					out.push_str(&with.to_display_string());
					if pattern.is_empty() {
						let Some(c) = rest[byte..].chars().next() else {
							rest = "";
							break;
						};
						out.push(c);
						rest = &rest[byte + c.len_utf8()..];
					} else {
						rest = &rest[byte + pattern.len()..];
					}
				}
				out.push_str(rest);
				self.check_string(out)?
			}
			"repeat" => {
				let count = arg(&args, 0).to_number();
				if !(0.0..f64::INFINITY).contains(&count) {
					return Err(ScriptError::Runtime(format!("invalid repeat count {}", format_number(count))));
				}
				let count = count as usize;
				if len().saturating_mul(count) > self.limits.max_string_len {
					return Err(ScriptError::SizeLimit(format!("string longer than {} chars", self.limits.max_string_len)));
				}
				Value::from(s.repeat(count))
			}
			"padStart" | "padEnd" => {
				let target = arg(&args, 0).to_number();
				let target = if target.is_nan() { 0 } else { target.max(0.0) as usize };
				if target > self.limits.max_string_len {
					return Err(ScriptError::SizeLimit(format!("string longer than {} chars", self.limits.max_string_len)));
				}
				let pad = match arg(&args, 1) {
					Value::Undefined => " ".to_owned(),
					pad => pad.to_display_string(),
				};
				let missing = target.saturating_sub(len());
				if missing == 0 || pad.is_empty() {
					return Ok(Value::str(s));
				}
				let fill: String = pad.chars().cycle().take(missing).collect();
				Value::from(if name == "padStart" { fill + s } else { format!("{s}{fill}") })
			}
			"concat" => {
				let mut out = s.to_owned();
				for value in &args {
					out.push_str(&value.to_display_string());
				}
				self.check_string(out)?
			}
			_ => return Err(ScriptError::Type(format!("string.{name} is not a function"))),
		})
	}

	fn array_method(&mut self, items: &Rc<RefCell<Vec<Value>>>, name: &str, args: Vec<Value>) -> Result<Value> {
		let snapshot = || items.borrow().clone();
		Ok(match name {
			"push" => {
				let len = items.borrow().len() + args.len();
				self.check_array_len(len)?;
				items.borrow_mut().extend(args);
				Value::Number(len as f64)
			}
			"pop" => items.borrow_mut().pop().unwrap_or_default(),
			"shift" => {
				let mut items = items.borrow_mut();
				if items.is_empty() { Value::Undefined } else { items.remove(0) }
			}
			"unshift" => {
				let len = items.borrow().len() + args.len();
				self.check_array_len(len)?;
				items.borrow_mut().splice(0..0, args);
				Value::Number(len as f64)
			}
			"join" => {
				let sep = match arg(&args, 0) {
					Value::Undefined => ",".to_owned(),
					sep => sep.to_display_string(),
				};
				self.check_string(join_array(items, &sep))?
			}
			"toString" => self.check_string(Value::Array(items.clone()).to_display_string())?,
			"slice" => {
				let items = items.borrow();
				let start = relative_index(&arg(&args, 0), items.len(), 0);
				let end = relative_index(&arg(&args, 1), items.len(), items.len());
				Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
			}
			"concat" => {
				let mut out = snapshot();
				for value in args {
					match value {
						Value::Array(other) => out.extend(other.borrow().iter().cloned()),
						other => out.push(other),
					}
				}
				self.check_array_len(out.len())?;
				Value::array(out)
			}
			"indexOf" | "lastIndexOf" | "includes" => {
				let needle = arg(&args, 0);
				let items = items.borrow();
				match name {
					"includes" => Value::Bool(items.iter().any(|item| same_value_zero(item, &needle))),
					"indexOf" => Value::Number(items.iter().position(|item| item.strict_eq(&needle)).map_or(-1.0, |idx| idx as f64)),
					_ => Value::Number(items.iter().rposition(|item| item.strict_eq(&needle)).map_or(-1.0, |idx| idx as f64)),
				}
			}
			"reverse" => {
				items.borrow_mut().reverse();
				Value::Array(items.clone())
			}
			"map" | "filter" | "forEach" | "some" | "every" | "find" | "findIndex" => {
				let callback = arg(&args, 0);
				let array = Value::Array(items.clone());
				let mut mapped = Vec::new();
				for (idx, item) in snapshot().into_iter().enumerate() {
					let result = self.call(&callback, vec![item.clone(), Value::Number(idx as f64), array.clone()])?;
					match name {
						"map" => mapped.push(result),
						"filter" if result.truthy() => mapped.push(item),
						"some" if result.truthy() => return Ok(Value::Bool(true)),
						"every" if !result.truthy() => return Ok(Value::Bool(false)),
						"find" if result.truthy() => return Ok(item),
						"findIndex" if result.truthy() => return Ok(Value::Number(idx as f64)),
						_ => {}
					}
				}
				match name {
					"map" | "filter" => Value::array(mapped),
					"some" => Value::Bool(false),
					"every" => Value::Bool(true),
					"findIndex" => Value::Number(-1.0),
					_ => Value::Undefined,
				}
			}
			"reduce" => {
				let callback = arg(&args, 0);
				let array = Value::Array(items.clone());
				let mut values = snapshot().into_iter().enumerate();
				let mut acc = match args.get(1) {
					Some(init) => init.clone(),
					None => match values.next() {
						Some((_, first)) => first,
						None => return Err(ScriptError::Type("reduce of empty array with no initial value".into())),
					},
				};
				for (idx, item) in values {
					acc = self.call(&callback, vec![acc, item, Value::Number(idx as f64), array.clone()])?;
				}
				acc
			}
			"sort" => {
				let comparator = arg(&args, 0);
				let sorted = self.merge_sort(snapshot(), &comparator)?;
				*items.borrow_mut() = sorted;
				Value::Array(items.clone())
			}
			_ => return Err(ScriptError::Type(format!("array.{name} is not a function"))),
		})
	}

	/// Stable sort whose comparator may fail or be inconsistent.
	fn merge_sort(&mut self, mut items: Vec<Value>, comparator: &Value) -> Result<Vec<Value>> {
		if items.len() <= 1 {
			return Ok(items);
		}
		let right = items.split_off(items.len() / 2);
		let left = self.merge_sort(items, comparator)?;
		let right = self.merge_sort(right, comparator)?;

		let mut out = Vec::with_capacity(left.len() + right.len());
		let mut left = left.into_iter().peekable();
		let mut right = right.into_iter().peekable();
		while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
			let right_first = match comparator {
				Value::Undefined => a.to_display_string() > b.to_display_string(),
				cmp => self.call(cmp, vec![a.clone(), b.clone()])?.to_number() > 0.0,
			};
			let next = if right_first { right.next() } else { left.next() };
			out.extend(next);
		}
		out.extend(left);
		out.extend(right);
		Ok(out)
	}
}

fn math(name: &str, args: &[Value]) -> Result<Value> {
	let x = || arg(args, 0).to_number();
	let numbers = || args.iter().map(Value::to_number);
	Ok(Value::Number(match name {
		"floor" => x().floor(),
		"ceil" => x().ceil(),
		"round" => (x() + 0.5).floor(),
		"abs" => x().abs(),
		"trunc" => x().trunc(),
		"sqrt" => x().sqrt(),
		"sign" => {
			let x = x();
			if x.is_nan() || x == 0.0 { x } else { x.signum() }
		}
		"pow" => x().powf(arg(args, 1).to_number()),
		"min" => numbers().fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
		"max" => numbers().fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
		_ => return Err(ScriptError::Type(format!("Math.{name} is not a function"))),
	}))
}

fn parse_int(s: &str, radix: Option<u32>) -> f64 {
	let s = s.trim_start();
	let (negative, mut s) = match s.as_bytes().first() {
		Some(b'-') => (true, &s[1..]),
		Some(b'+') => (false, &s[1..]),
		_ => (false, s),
	};
	let mut radix = radix.unwrap_or(10);
	if matches!(radix, 10 | 16)
		&& let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
	{
		s = hex;
		radix = 16;
	}
	if !(2..=36).contains(&radix) {
		return f64::NAN;
	}
	let mut value = None;
	for c in s.chars() {
		let Some(digit) = c.to_digit(radix) else {
			break;
		};
		value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
	}
	match value {
		Some(v) if negative => -v,
		Some(v) => v,
		None => f64::NAN,
	}
}

fn parse_float(s: &str) -> f64 {
	let s = s.trim_start();
	let bytes = s.as_bytes();
	let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
	if s[end..].starts_with("Infinity") {
		return if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
	}
	let digits_start = end;
	let digit_at = |idx: usize| bytes.get(idx).is_some_and(u8::is_ascii_digit);
	while digit_at(end) {
		end += 1;
	}
	let int_digits = end - digits_start;
	let mut frac_digits = 0;
	if bytes.get(end) == Some(&b'.') {
		let dot = end;
		end += 1;
		while digit_at(end) {
			end += 1;
		}
		frac_digits = end - dot - 1;
		if int_digits == 0 && frac_digits == 0 {
			end = dot;
		}
	}
	if int_digits == 0 && frac_digits == 0 {
		return f64::NAN;
	}
	if matches!(bytes.get(end), Some(b'e' | b'E')) {
		let mut exp = end + 1;
		if matches!(bytes.get(exp), Some(b'+' | b'-')) {
			exp += 1;
		}
		let exp_digits = exp;
		while digit_at(exp) {
			exp += 1;
		}
		if exp > exp_digits {
			end = exp;
		}
	}
	s[..end].parse().unwrap_or(f64::NAN)
}
