use std::sync::Arc;

use super::{Parser, parse_expression_at};
use crate::ast::{AssignOp, BinaryOp, Expr, FunctionBody, FunctionDef, LogicalOp, TemplateSegment, UnaryOp};
use crate::error::Result;
use crate::lexer::{Keyword, Punct, TemplatePart, TokenKind};

#[derive(Clone, Copy)]
enum Infix {
	Binary(BinaryOp),
	Logical(LogicalOp),
}

/// Binding power of an infix operator; higher binds tighter.
fn infix(kind: &TokenKind) -> Option<(u8, Infix)> {
	let TokenKind::Punct(punct) = kind else {
		return None;
	};
	Some(match punct {
		Punct::Nullish => (1, Infix::Logical(LogicalOp::Nullish)),
		Punct::OrOr => (2, Infix::Logical(LogicalOp::Or)),
		Punct::AndAnd => (3, Infix::Logical(LogicalOp::And)),
		Punct::Eq => (4, Infix::Binary(BinaryOp::Eq)),
		Punct::NotEq => (4, Infix::Binary(BinaryOp::NotEq)),
		Punct::StrictEq => (4, Infix::Binary(BinaryOp::StrictEq)),
		Punct::StrictNotEq => (4, Infix::Binary(BinaryOp::StrictNotEq)),
		Punct::Lt => (5, Infix::Binary(BinaryOp::Lt)),
		Punct::LtEq => (5, Infix::Binary(BinaryOp::LtEq)),
		Punct::Gt => (5, Infix::Binary(BinaryOp::Gt)),
		Punct::GtEq => (5, Infix::Binary(BinaryOp::GtEq)),
		Punct::Plus => (6, Infix::Binary(BinaryOp::Add)),
		Punct::Minus => (6, Infix::Binary(BinaryOp::Sub)),
		Punct::Star => (7, Infix::Binary(BinaryOp::Mul)),
		Punct::Slash => (7, Infix::Binary(BinaryOp::Div)),
		Punct::Percent => (7, Infix::Binary(BinaryOp::Rem)),
		_ => return None,
	})
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
	let TokenKind::Punct(punct) = kind else {
		return None;
	};
	Some(AssignOp(match punct {
		Punct::Assign => None,
		Punct::PlusAssign => Some(BinaryOp::Add),
		Punct::MinusAssign => Some(BinaryOp::Sub),
		Punct::StarAssign => Some(BinaryOp::Mul),
		Punct::SlashAssign => Some(BinaryOp::Div),
		Punct::PercentAssign => Some(BinaryOp::Rem),
		_ => return None,
	}))
}

impl Parser {
	pub(crate) fn expression(&mut self) -> Result<Expr> {
		self.assignment()
	}

	pub(super) fn assignment(&mut self) -> Result<Expr> {
		self.nested(Self::assignment_inner)
	}

	fn assignment_inner(&mut self) -> Result<Expr> {
		if let Some(arrow) = self.arrow_function()? {
			return Ok(arrow);
		}

		let target = self.conditional()?;
		let Some(op) = assign_op(&self.peek().kind) else {
			return Ok(target);
		};
		if !target.is_assignable() {
			return Err(self.error("invalid assignment target"));
		}
		self.next();
		let value = self.assignment()?;
		Ok(Expr::Assign {
			op,
			target: Box::new(target),
			value: Box::new(value),
		})
	}

	/// Parses `x => ...` or `(a, b) => ...` when the lookahead confirms an arrow.
	fn arrow_function(&mut self) -> Result<Option<Expr>> {
		let params = match (self.peek().kind.clone(), self.peek_kind_at(1).clone()) {
			(TokenKind::Ident(name), TokenKind::Punct(Punct::Arrow)) => {
				self.next();
				vec![name]
			}
			(TokenKind::Punct(Punct::LParen), _) if self.arrow_params_ahead() => {
				self.next();
				let mut params = Vec::new();
				while !self.at_punct(Punct::RParen) {
					params.push(self.expect_ident()?);
					if !self.eat_punct(Punct::Comma) {
						break;
					}
				}
				self.expect_punct(Punct::RParen)?;
				params
			}
			_ => return Ok(None),
		};
		self.expect_punct(Punct::Arrow)?;

		let body = if self.at_punct(Punct::LBrace) {
			FunctionBody::Block(self.block()?)
		} else {
			FunctionBody::Expr(self.assignment()?)
		};
		Ok(Some(Expr::Function(Arc::new(FunctionDef { name: None, params, body }))))
	}

	/// Scans `( ident, ident ) =>` without consuming anything.
	fn arrow_params_ahead(&self) -> bool {
		let mut offset = 1;
		let mut expect_ident = true;
		loop {
			match (self.peek_kind_at(offset), expect_ident) {
				(TokenKind::Punct(Punct::RParen), _) => {
					return matches!(self.peek_kind_at(offset + 1), TokenKind::Punct(Punct::Arrow));
				}
				(TokenKind::Ident(_), true) => expect_ident = false,
				(TokenKind::Punct(Punct::Comma), false) => expect_ident = true,
				_ => return false,
			}
			offset += 1;
		}
	}

	fn conditional(&mut self) -> Result<Expr> {
		let cond = self.binary(1)?;
		if !self.eat_punct(Punct::Question) {
			return Ok(cond);
		}
		let then = self.assignment()?;
		self.expect_punct(Punct::Colon)?;
		let otherwise = self.assignment()?;
		Ok(Expr::Conditional {
			cond: Box::new(cond),
			then: Box::new(then),
			otherwise: Box::new(otherwise),
		})
	}

	fn binary(&mut self, min_power: u8) -> Result<Expr> {
		let mut lhs = self.unary()?;
		let mut links = 0;
		while let Some((power, op)) = infix(&self.peek().kind) {
			if power < min_power {
				break;
			}
			links += 1;
			self.check_chain(links)?;
			self.next();
			let rhs = Box::new(self.binary(power + 1)?);
			let left = Box::new(lhs);
			lhs = match op {
				Infix::Binary(op) => Expr::Binary { op, lhs: left, rhs },
				Infix::Logical(op) => Expr::Logical { op, lhs: left, rhs },
			};
		}
		Ok(lhs)
	}

	fn unary(&mut self) -> Result<Expr> {
		let op = match self.peek().kind {
			TokenKind::Punct(Punct::Bang) => UnaryOp::Not,
			TokenKind::Punct(Punct::Minus) => UnaryOp::Neg,
			TokenKind::Punct(Punct::Plus) => UnaryOp::Plus,
			TokenKind::Keyword(Keyword::Typeof) => UnaryOp::Typeof,
			TokenKind::Punct(p @ (Punct::PlusPlus | Punct::MinusMinus)) => {
				self.next();
				let target = self.nested(Self::unary)?;
				if !target.is_assignable() {
					return Err(self.error("invalid increment target"));
				}
				return Ok(Expr::Update {
					target: Box::new(target),
					increment: p == Punct::PlusPlus,
					prefix: true,
				});
			}
			_ => return self.postfix(),
		};
		self.next();
		let expr = Box::new(self.nested(Self::unary)?);
		Ok(Expr::Unary { op, expr })
	}

	fn postfix(&mut self) -> Result<Expr> {
		let expr = self.call_member()?;
		let token = self.peek();
		let increment = match token.kind {
			TokenKind::Punct(Punct::PlusPlus) if !token.newline_before => true,
			TokenKind::Punct(Punct::MinusMinus) if !token.newline_before => false,
			_ => return Ok(expr),
		};
		if !expr.is_assignable() {
			return Err(self.error("invalid increment target"));
		}
		self.next();
		Ok(Expr::Update {
			target: Box::new(expr),
			increment,
			prefix: false,
		})
	}

	fn call_member(&mut self) -> Result<Expr> {
		let mut expr = self.primary()?;
		let mut links = 0;
		loop {
			if matches!(self.peek().kind, TokenKind::Punct(Punct::Dot | Punct::LBracket | Punct::LParen)) {
				links += 1;
				self.check_chain(links)?;
			}
			match self.peek().kind {
				TokenKind::Punct(Punct::Dot) => {
					self.next();
					let property = match self.next().kind {
						TokenKind::Ident(name) => name,
						TokenKind::Keyword(kw) => format!("{kw:?}").to_lowercase(),
						other => return Err(self.error(format!("expected property name, found {other}"))),
					};
					expr = Expr::Member {
						object: Box::new(expr),
						property,
					};
				}
				TokenKind::Punct(Punct::LBracket) => {
					self.next();
					let index = self.expression()?;
					self.expect_punct(Punct::RBracket)?;
					expr = Expr::Index {
						object: Box::new(expr),
						index: Box::new(index),
					};
				}
				TokenKind::Punct(Punct::LParen) => {
					self.next();
					let args = self.list(Punct::RParen)?;
					expr = Expr::Call {
						callee: Box::new(expr),
						args,
					};
				}
				_ => return Ok(expr),
			}
		}
	}

	/// Comma separated expressions up to `close`, trailing comma allowed.
	fn list(&mut self, close: Punct) -> Result<Vec<Expr>> {
		let mut items = Vec::new();
		while !self.at_punct(close) {
			items.push(self.assignment()?);
			if !self.eat_punct(Punct::Comma) {
				break;
			}
		}
		self.expect_punct(close)?;
		Ok(items)
	}

	fn primary(&mut self) -> Result<Expr> {
		let token = self.next();
		Ok(match token.kind {
			TokenKind::Number(n) => Expr::Number(n),
			TokenKind::Str(s) => Expr::Str(s),
			TokenKind::Template(parts) => {
				let mut segments = Vec::with_capacity(parts.len());
				for part in parts {
					segments.push(match part {
						TemplatePart::Text(text) => TemplateSegment::Text(text),
						TemplatePart::Expr(src, pos) => TemplateSegment::Expr(parse_expression_at(&src, pos, self.depth)?),
					});
				}
				Expr::Template(segments)
			}
			TokenKind::Ident(name) => Expr::Ident(name),
			TokenKind::Keyword(Keyword::True) => Expr::Bool(true),
			TokenKind::Keyword(Keyword::False) => Expr::Bool(false),
			TokenKind::Keyword(Keyword::Null) => Expr::Null,
			TokenKind::Keyword(Keyword::Undefined) => Expr::Undefined,
			TokenKind::Keyword(Keyword::Function) => {
				let name = match self.peek().kind.clone() {
					TokenKind::Ident(name) => {
						self.next();
						Some(name)
					}
					_ => None,
				};
				Expr::Function(Arc::new(self.function_rest(name)?))
			}
			TokenKind::Punct(Punct::LParen) => {
				let inner = self.expression()?;
				self.expect_punct(Punct::RParen)?;
				inner
			}
			TokenKind::Punct(Punct::LBracket) => Expr::Array(self.list(Punct::RBracket)?),
			other => {
				let pos = token.pos;
				return Err(crate::error::ScriptError::syntax(pos.line, pos.col, format!("unexpected {other}")));
			}
		})
	}
}
