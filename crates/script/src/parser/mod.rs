//! Recursive-descent parser for block code.
//!
//! Statements are handled here; expressions live in [`expr`]. Semicolons are
//! optional at the end of a statement, mirroring the loose style snippet
//! authors write in.

mod expr;

use std::sync::Arc;

use crate::ast::{DeclKind, Declarator, FunctionBody, FunctionDef, Program, Stmt};
use crate::error::{Result, ScriptError};
use crate::lexer::{Keyword, Pos, Punct, Token, TokenKind, tokenize};


/// Deepest nesting of statements and expressions a source may use.
pub const MAX_NESTING: usize = 128;

/// Parses a complete program.
pub fn parse_program(src: &str) -> Result<Program> {
	parse_program_at(src, Pos { line: 1, col: 1 })
}

/// Parses a program whose first character sits at `origin` in a larger file.
///
/// Used by the snippet compiler so syntax errors point at the definition file
/// line the block came from.
pub fn parse_program_at(src: &str, origin: Pos) -> Result<Program> {
	let mut parser = Parser::new(tokenize(src, origin)?);
	let mut body = Vec::new();
	while !parser.at_eof() {
		body.push(parser.statement()?);
	}
	Ok(Program { body })
}

/// Parses a single expression, rejecting trailing tokens.
pub fn parse_expression(src: &str) -> Result<crate::ast::Expr> {
	parse_expression_at(src, Pos { line: 1, col: 1 }, 0)
}

/// Parses a template interpolation, continuing the nesting count of the
/// parser that found it.
pub(crate) fn parse_expression_at(src: &str, origin: Pos, depth: usize) -> Result<crate::ast::Expr> {
	let mut parser = Parser::new(tokenize(src, origin)?);
	parser.depth = depth;
	let expr = parser.expression()?;
	if !parser.at_eof() {
		return Err(parser.unexpected());
	}
	Ok(expr)
}

pub(crate) struct Parser {
	tokens: Vec<Token>,
	idx: usize,
	depth: usize,
}

impl Parser {
	fn new(tokens: Vec<Token>) -> Self {
		Self { tokens, idx: 0, depth: 0 }
	}

	/// Runs `parse` one nesting level deeper, failing past [`MAX_NESTING`].
	fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
		if self.depth >= MAX_NESTING {
			return Err(self.error(format!("nesting deeper than {MAX_NESTING} levels")));
		}
		self.depth += 1;
		let parsed = parse(self);
		self.depth -= 1;
		parsed
	}

	/// Operator chains build nested trees without recursing here, so their
	/// length counts against the same limit.
	fn check_chain(&self, links: usize) -> Result<()> {
		if self.depth + links > MAX_NESTING {
			return Err(self.error(format!("nesting deeper than {MAX_NESTING} levels")));
		}
		Ok(())
	}

	fn peek(&self) -> &Token {
		let last = self.tokens.len() - 1;
		&self.tokens[self.idx.min(last)]
	}

	fn peek_kind_at(&self, offset: usize) -> &TokenKind {
		let last = self.tokens.len() - 1;
		&self.tokens[(self.idx + offset).min(last)].kind
	}

	fn next(&mut self) -> Token {
		let token = self.peek().clone();
		if self.idx < self.tokens.len() - 1 {
			self.idx += 1;
		}
		token
	}

	fn at_eof(&self) -> bool {
		matches!(self.peek().kind, TokenKind::Eof)
	}

	fn at_punct(&self, punct: Punct) -> bool {
		self.peek().kind == TokenKind::Punct(punct)
	}

	fn at_keyword(&self, kw: Keyword) -> bool {
		self.peek().kind == TokenKind::Keyword(kw)
	}

	fn eat_punct(&mut self, punct: Punct) -> bool {
		if self.at_punct(punct) {
			self.next();
			true
		} else {
			false
		}
	}

	fn expect_punct(&mut self, punct: Punct) -> Result<()> {
		if self.eat_punct(punct) {
			Ok(())
		} else {
			Err(self.error(format!("expected `{}`, found {}", punct.as_str(), self.peek().kind)))
		}
	}

	fn expect_ident(&mut self) -> Result<String> {
		match self.peek().kind.clone() {
			TokenKind::Ident(name) => {
				self.next();
				Ok(name)
			}
			other => Err(self.error(format!("expected identifier, found {other}"))),
		}
	}

	fn error(&self, message: impl Into<String>) -> ScriptError {
		let pos = self.peek().pos;
		ScriptError::syntax(pos.line, pos.col, message)
	}

	fn unexpected(&self) -> ScriptError {
		self.error(format!("unexpected {}", self.peek().kind))
	}

	/// Consumes an optional `;` terminating a simple statement.
	fn end_statement(&mut self) -> Result<()> {
		if self.eat_punct(Punct::Semi) || self.at_punct(Punct::RBrace) || self.at_eof() || self.peek().newline_before {
			Ok(())
		} else {
			Err(self.unexpected())
		}
	}

	fn statement(&mut self) -> Result<Stmt> {
		self.nested(Self::statement_inner)
	}

	fn statement_inner(&mut self) -> Result<Stmt> {
		match self.peek().kind.clone() {
			TokenKind::Punct(Punct::Semi) => {
				self.next();
				Ok(Stmt::Empty)
			}
			TokenKind::Punct(Punct::LBrace) => Ok(Stmt::Block(self.block()?)),
			TokenKind::Keyword(kw @ (Keyword::Let | Keyword::Const | Keyword::Var)) => {
				self.next();
				let stmt = self.declaration(decl_kind(kw))?;
				self.end_statement()?;
				Ok(stmt)
			}
			TokenKind::Keyword(Keyword::If) => self.if_statement(),
			TokenKind::Keyword(Keyword::While) => {
				self.next();
				self.expect_punct(Punct::LParen)?;
				let cond = self.expression()?;
				self.expect_punct(Punct::RParen)?;
				let body = Box::new(self.statement()?);
				Ok(Stmt::While { cond, body })
			}
			TokenKind::Keyword(Keyword::For) => self.for_statement(),
			TokenKind::Keyword(Keyword::Function) if matches!(self.peek_kind_at(1), TokenKind::Ident(_)) => {
				self.next();
				let name = self.expect_ident()?;
				let def = self.function_rest(Some(name))?;
				Ok(Stmt::Function(Arc::new(def)))
			}
			TokenKind::Keyword(Keyword::Return) => {
				self.next();
				let value = if self.at_punct(Punct::Semi) || self.at_punct(Punct::RBrace) || self.at_eof() || self.peek().newline_before {
					None
				} else {
					Some(self.expression()?)
				};
				self.end_statement()?;
				Ok(Stmt::Return(value))
			}
			TokenKind::Keyword(Keyword::Break) => {
				self.next();
				self.end_statement()?;
				Ok(Stmt::Break)
			}
			TokenKind::Keyword(Keyword::Continue) => {
				self.next();
				self.end_statement()?;
				Ok(Stmt::Continue)
			}
			_ => {
				let expr = self.expression()?;
				self.end_statement()?;
				Ok(Stmt::Expr(expr))
			}
		}
	}

	fn block(&mut self) -> Result<Vec<Stmt>> {
		self.expect_punct(Punct::LBrace)?;
		let mut body = Vec::new();
		while !self.at_punct(Punct::RBrace) {
			if self.at_eof() {
				return Err(self.error("unterminated block, expected `}`"));
			}
			body.push(self.statement()?);
		}
		self.next();
		Ok(body)
	}

	fn declaration(&mut self, kind: DeclKind) -> Result<Stmt> {
		let mut decls = Vec::new();
		loop {
			let name = self.expect_ident()?;
			let init = if self.eat_punct(Punct::Assign) {
				Some(self.assignment()?)
			} else if kind == DeclKind::Const {
				return Err(self.error(format!("missing initializer in const declaration of `{name}`")));
			} else {
				None
			};
			decls.push(Declarator { name, init });
			if !self.eat_punct(Punct::Comma) {
				break;
			}
		}
		Ok(Stmt::Decl { kind, decls })
	}

	fn if_statement(&mut self) -> Result<Stmt> {
		self.next();
		self.expect_punct(Punct::LParen)?;
		let cond = self.expression()?;
		self.expect_punct(Punct::RParen)?;
		let then = Box::new(self.statement()?);
		let otherwise = if self.at_keyword(Keyword::Else) {
			self.next();
			Some(Box::new(self.statement()?))
		} else {
			None
		};
		Ok(Stmt::If { cond, then, otherwise })
	}

	fn for_statement(&mut self) -> Result<Stmt> {
		self.next();
		self.expect_punct(Punct::LParen)?;

		let lookahead = (self.peek().kind.clone(), self.peek_kind_at(1).clone(), self.peek_kind_at(2).clone());
		let of_binding = match lookahead {
			(TokenKind::Keyword(kw @ (Keyword::Let | Keyword::Const | Keyword::Var)), TokenKind::Ident(_), TokenKind::Keyword(Keyword::Of)) => {
				self.next();
				Some(decl_kind(kw))
			}
			(TokenKind::Ident(_), TokenKind::Keyword(Keyword::Of), _) => Some(DeclKind::Var),
			_ => None,
		};
		if let Some(kind) = of_binding {
			let name = self.expect_ident()?;
			self.next();
			let iter = self.expression()?;
			self.expect_punct(Punct::RParen)?;
			let body = Box::new(self.statement()?);
			return Ok(Stmt::ForOf { kind, name, iter, body });
		}

		let init = match self.peek().kind.clone() {
			TokenKind::Punct(Punct::Semi) => None,
			TokenKind::Keyword(kw @ (Keyword::Let | Keyword::Const | Keyword::Var)) => {
				self.next();
				Some(Box::new(self.declaration(decl_kind(kw))?))
			}
			_ => Some(Box::new(Stmt::Expr(self.expression()?))),
		};
		self.expect_punct(Punct::Semi)?;
		let cond = if self.at_punct(Punct::Semi) { None } else { Some(self.expression()?) };
		self.expect_punct(Punct::Semi)?;
		let update = if self.at_punct(Punct::RParen) { None } else { Some(self.expression()?) };
		self.expect_punct(Punct::RParen)?;
		let body = Box::new(self.statement()?);
		Ok(Stmt::For { init, cond, update, body })
	}

	/// Parses `(params) { body }` after `function [name]`.
	fn function_rest(&mut self, name: Option<String>) -> Result<FunctionDef> {
		self.expect_punct(Punct::LParen)?;
		let mut params = Vec::new();
		while !self.at_punct(Punct::RParen) {
			params.push(self.expect_ident()?);
			if !self.eat_punct(Punct::Comma) {
				break;
			}
		}
		self.expect_punct(Punct::RParen)?;
		let body = FunctionBody::Block(self.block()?);
		Ok(FunctionDef { name, params, body })
	}
}

fn decl_kind(kw: Keyword) -> DeclKind {
	match kw {
		Keyword::Const => DeclKind::Const,
		Keyword::Var => DeclKind::Var,
		_ => DeclKind::Let,
	}
}
