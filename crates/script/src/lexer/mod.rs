//! Tokenizer for block code.

use std::fmt;

use crate::error::{Result, ScriptError};

#[cfg(test)]
mod tests;

/// Source position of a token, both components 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
	pub line: u32,
	pub col: u32,
}

/// A token with its position and line-break context.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub pos: Pos,
	/// True if a line break separates this token from the previous one.
	pub newline_before: bool,
}

/// Piece of a template string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
	/// Literal text with escapes already resolved.
	Text(String),
	/// Raw source of a `${...}` interpolation and where it starts.
	Expr(String, Pos),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
	Ident(String),
	Number(f64),
	Str(String),
	Template(Vec<TemplatePart>),
	Keyword(Keyword),
	Punct(Punct),
	Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
	Let,
	Const,
	Var,
	If,
	Else,
	While,
	For,
	Of,
	Function,
	Return,
	Break,
	Continue,
	True,
	False,
	Null,
	Undefined,
	Typeof,
}

impl Keyword {
	fn from_ident(ident: &str) -> Option<Self> {
		Some(match ident {
			"let" => Self::Let,
			"const" => Self::Const,
			"var" => Self::Var,
			"if" => Self::If,
			"else" => Self::Else,
			"while" => Self::While,
			"for" => Self::For,
			"of" => Self::Of,
			"function" => Self::Function,
			"return" => Self::Return,
			"break" => Self::Break,
			"continue" => Self::Continue,
			"true" => Self::True,
			"false" => Self::False,
			"null" => Self::Null,
			"undefined" => Self::Undefined,
			"typeof" => Self::Typeof,
			_ => return None,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
	LParen,
	RParen,
	LBrace,
	RBrace,
	LBracket,
	RBracket,
	Comma,
	Semi,
	Dot,
	Question,
	Colon,
	Arrow,
	Assign,
	PlusAssign,
	MinusAssign,
	StarAssign,
	SlashAssign,
	PercentAssign,
	Eq,
	NotEq,
	StrictEq,
	StrictNotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	AndAnd,
	OrOr,
	Nullish,
	PlusPlus,
	MinusMinus,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ident(name) => write!(f, "identifier `{name}`"),
			Self::Number(n) => write!(f, "number {n}"),
			Self::Str(_) => f.write_str("string literal"),
			Self::Template(_) => f.write_str("template literal"),
			Self::Keyword(kw) => write!(f, "keyword `{}`", format!("{kw:?}").to_lowercase()),
			Self::Punct(p) => write!(f, "`{}`", p.as_str()),
			Self::Eof => f.write_str("end of input"),
		}
	}
}

impl Punct {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::LParen => "(",
			Self::RParen => ")",
			Self::LBrace => "{",
			Self::RBrace => "}",
			Self::LBracket => "[",
			Self::RBracket => "]",
			Self::Comma => ",",
			Self::Semi => ";",
			Self::Dot => ".",
			Self::Question => "?",
			Self::Colon => ":",
			Self::Arrow => "=>",
			Self::Assign => "=",
			Self::PlusAssign => "+=",
			Self::MinusAssign => "-=",
			Self::StarAssign => "*=",
			Self::SlashAssign => "/=",
			Self::PercentAssign => "%=",
			Self::Eq => "==",
			Self::NotEq => "!=",
			Self::StrictEq => "===",
			Self::StrictNotEq => "!==",
			Self::Lt => "<",
			Self::LtEq => "<=",
			Self::Gt => ">",
			Self::GtEq => ">=",
			Self::Plus => "+",
			Self::Minus => "-",
			Self::Star => "*",
			Self::Slash => "/",
			Self::Percent => "%",
			Self::Bang => "!",
			Self::AndAnd => "&&",
			Self::OrOr => "||",
			Self::Nullish => "??",
			Self::PlusPlus => "++",
			Self::MinusMinus => "--",
		}
	}
}

/// Longest punctuators first so that `===` wins over `==` and `=`.
const PUNCTS: &[(&str, Punct)] = &[
	("===", Punct::StrictEq),
	("!==", Punct::StrictNotEq),
	("=>", Punct::Arrow),
	("==", Punct::Eq),
	("!=", Punct::NotEq),
	("<=", Punct::LtEq),
	(">=", Punct::GtEq),
	("&&", Punct::AndAnd),
	("||", Punct::OrOr),
	("??", Punct::Nullish),
	("++", Punct::PlusPlus),
	("--", Punct::MinusMinus),
	("+=", Punct::PlusAssign),
	("-=", Punct::MinusAssign),
	("*=", Punct::StarAssign),
	("/=", Punct::SlashAssign),
	("%=", Punct::PercentAssign),
	("(", Punct::LParen),
	(")", Punct::RParen),
	("{", Punct::LBrace),
	("}", Punct::RBrace),
	("[", Punct::LBracket),
	("]", Punct::RBracket),
	(",", Punct::Comma),
	(";", Punct::Semi),
	(".", Punct::Dot),
	("?", Punct::Question),
	(":", Punct::Colon),
	("=", Punct::Assign),
	("<", Punct::Lt),
	(">", Punct::Gt),
	("+", Punct::Plus),
	("-", Punct::Minus),
	("*", Punct::Star),
	("/", Punct::Slash),
	("%", Punct::Percent),
	("!", Punct::Bang),
];

struct Lexer<'a> {
	src: &'a str,
	chars: Vec<char>,
	idx: usize,
	byte: usize,
	line: u32,
	col: u32,
}

/// Splits `src` into tokens, always ending with [`TokenKind::Eof`].
///
/// `origin` is the position of the first character of `src`, which lets
/// template interpolations report errors relative to the enclosing source.
pub fn tokenize(src: &str, origin: Pos) -> Result<Vec<Token>> {
	let mut lexer = Lexer {
		src,
		chars: src.chars().collect(),
		idx: 0,
		byte: 0,
		line: origin.line.max(1),
		col: origin.col.max(1),
	};
	lexer.run()
}

impl Lexer<'_> {
	fn peek(&self) -> Option<char> {
		self.chars.get(self.idx).copied()
	}

	fn peek_at(&self, offset: usize) -> Option<char> {
		self.chars.get(self.idx + offset).copied()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.chars.get(self.idx).copied()?;
		self.idx += 1;
		self.byte += c.len_utf8();
		if c == '\n' {
			self.line += 1;
			self.col = 1;
		} else {
			self.col += 1;
		}
		Some(c)
	}

	fn pos(&self) -> Pos {
		Pos {
			line: self.line,
			col: self.col,
		}
	}

	fn error(&self, message: impl Into<String>) -> ScriptError {
		ScriptError::syntax(self.line, self.col, message)
	}

	fn run(&mut self) -> Result<Vec<Token>> {
		let mut tokens = Vec::new();
		loop {
			let newline_before = self.skip_trivia()?;
			let pos = self.pos();
			let Some(c) = self.peek() else {
				tokens.push(Token {
					kind: TokenKind::Eof,
					pos,
					newline_before,
				});
				return Ok(tokens);
			};

			let kind = if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
				self.number()?
			} else if is_ident_start(c) {
				let ident = self.ident();
				match Keyword::from_ident(&ident) {
					Some(kw) => TokenKind::Keyword(kw),
					None => TokenKind::Ident(ident),
				}
			} else if c == '"' || c == '\'' {
				self.bump();
				TokenKind::Str(self.string(c)?)
			} else if c == '`' {
				self.bump();
				TokenKind::Template(self.template()?)
			} else {
				TokenKind::Punct(self.punct()?)
			};

			tokens.push(Token { kind, pos, newline_before });
		}
	}

	/// Skips whitespace and comments, reporting whether a line break was seen.
	fn skip_trivia(&mut self) -> Result<bool> {
		let mut newline = false;
		loop {
			match (self.peek(), self.peek_at(1)) {
				(Some('\n'), _) => {
					newline = true;
					self.bump();
				}
				(Some(c), _) if c.is_whitespace() => {
					self.bump();
				}
				(Some('/'), Some('/')) => {
					while self.peek().is_some_and(|c| c != '\n') {
						self.bump();
					}
				}
				(Some('/'), Some('*')) => {
					self.bump();
					self.bump();
					loop {
						match (self.peek(), self.peek_at(1)) {
							(Some('*'), Some('/')) => {
								self.bump();
								self.bump();
								break;
							}
							(Some(c), _) => {
								newline |= c == '\n';
								self.bump();
							}
							(None, _) => return Err(self.error("unterminated block comment")),
						}
					}
				}
				_ => return Ok(newline),
			}
		}
	}

	fn number(&mut self) -> Result<TokenKind> {
		let start = self.idx;
		if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
			self.bump();
			self.bump();
			let digits_start = self.idx;
			while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
				self.bump();
			}
			let digits: String = self.chars[digits_start..self.idx].iter().collect();
			return u64::from_str_radix(&digits, 16)
				.map(|n| TokenKind::Number(n as f64))
				.map_err(|_| self.error("malformed hex literal"));
		}

		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.bump();
		}
		if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
			self.bump();
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.bump();
			}
		}
		if matches!(self.peek(), Some('e' | 'E')) {
			let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
			if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
				for _ in 0..=sign {
					self.bump();
				}
				while self.peek().is_some_and(|c| c.is_ascii_digit()) {
					self.bump();
				}
			}
		}

		let text: String = self.chars[start..self.idx].iter().collect();
		text.parse::<f64>()
			.map(TokenKind::Number)
			.map_err(|_| self.error(format!("malformed number `{text}`")))
	}

	fn ident(&mut self) -> String {
		let mut out = String::new();
		while let Some(c) = self.peek().filter(|&c| is_ident_continue(c)) {
			out.push(c);
			self.bump();
		}
		out
	}

	fn escape(&mut self) -> Result<char> {
		let Some(c) = self.bump() else {
			return Err(self.error("unterminated escape sequence"));
		};
		Ok(match c {
			'n' => '\n',
			't' => '\t',
			'r' => '\r',
			'0' => '\0',
			'b' => '\u{8}',
			'f' => '\u{c}',
			'v' => '\u{b}',
			'u' => {
				let braced = self.peek() == Some('{');
				if braced {
					self.bump();
				}
				let mut hex = String::new();
				while let Some(h) = self.peek().filter(|h| h.is_ascii_hexdigit()) {
					if !braced && hex.len() == 4 {
						break;
					}
					hex.push(h);
					self.bump();
				}
				if braced && self.bump() != Some('}') {
					return Err(self.error("unterminated unicode escape"));
				}
				u32::from_str_radix(&hex, 16)
					.ok()
					.and_then(char::from_u32)
					.ok_or_else(|| self.error("invalid unicode escape"))?
			}
			other => other,
		})
	}

	fn string(&mut self, quote: char) -> Result<String> {
		let mut out = String::new();
		loop {
			match self.bump() {
				Some(c) if c == quote => return Ok(out),
				Some('\\') => out.push(self.escape()?),
				Some('\n') | None => return Err(self.error("unterminated string literal")),
				Some(c) => out.push(c),
			}
		}
	}

	fn template(&mut self) -> Result<Vec<TemplatePart>> {
		let mut parts = Vec::new();
		let mut text = String::new();
		loop {
			match self.bump() {
				Some('`') => break,
				Some('\\') => text.push(self.escape()?),
				Some('$') if self.peek() == Some('{') => {
					self.bump();
					if !text.is_empty() {
						parts.push(TemplatePart::Text(std::mem::take(&mut text)));
					}
					let pos = self.pos();
					parts.push(TemplatePart::Expr(self.interpolation()?, pos));
				}
				Some(c) => text.push(c),
				None => return Err(self.error("unterminated template literal")),
			}
		}
		if !text.is_empty() || parts.is_empty() {
			parts.push(TemplatePart::Text(text));
		}
		Ok(parts)
	}

	/// Collects the raw source of a `${...}` body up to its matching brace.
	fn interpolation(&mut self) -> Result<String> {
		let start = self.idx;
		let mut depth = 0usize;
		loop {
			match self.peek() {
				Some('}') if depth == 0 => {
					let raw: String = self.chars[start..self.idx].iter().collect();
					self.bump();
					return Ok(raw);
				}
				Some('{') => depth += 1,
				Some('}') => depth -= 1,
				Some(q @ ('"' | '\'')) => {
					self.bump();
					self.string(q)?;
					continue;
				}
				Some(_) => {}
				None => return Err(self.error("unterminated template interpolation")),
			}
			self.bump();
		}
	}

	fn punct(&mut self) -> Result<Punct> {
		let rest = &self.src[self.byte..];
		for (text, punct) in PUNCTS {
			if rest.starts_with(text) {
				for _ in 0..text.len() {
					self.bump();
				}
				return Ok(*punct);
			}
		}
		let c = self.peek().unwrap_or_default();
		Err(self.error(format!("unexpected character `{c}`")))
	}
}

fn is_ident_start(c: char) -> bool {
	c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
	is_ident_start(c) || c.is_alphanumeric()
}
