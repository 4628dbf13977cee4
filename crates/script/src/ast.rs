//! Syntax tree produced by the parser.
//!
//! Trees are immutable once built and shared behind [`Arc`] so a compiled
//! definition file can hand the same preamble to every snippet it contains.

use std::sync::Arc;

/// A parsed sequence of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
	pub body: Vec<Stmt>,
}

impl Program {
	/// Returns true if the program has no statements.
	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
	Let,
	Const,
	Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
	pub name: String,
	pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
	Decl {
		kind: DeclKind,
		decls: Vec<Declarator>,
	},
	Expr(Expr),
	If {
		cond: Expr,
		then: Box<Stmt>,
		otherwise: Option<Box<Stmt>>,
	},
	While {
		cond: Expr,
		body: Box<Stmt>,
	},
	For {
		init: Option<Box<Stmt>>,
		cond: Option<Expr>,
		update: Option<Expr>,
		body: Box<Stmt>,
	},
	ForOf {
		kind: DeclKind,
		name: String,
		iter: Expr,
		body: Box<Stmt>,
	},
	Block(Vec<Stmt>),
	Function(Arc<FunctionDef>),
	Return(Option<Expr>),
	Break,
	Continue,
	Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
	pub name: Option<String>,
	pub params: Vec<String>,
	pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
	/// Arrow function with an expression body.
	Expr(Expr),
	Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSegment {
	Text(String),
	Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Neg,
	Plus,
	Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Eq,
	NotEq,
	StrictEq,
	StrictNotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
	And,
	Or,
	Nullish,
}

/// Assignment operators; `None` is plain `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOp(pub Option<BinaryOp>);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Number(f64),
	Str(String),
	Bool(bool),
	Null,
	Undefined,
	Template(Vec<TemplateSegment>),
	Array(Vec<Expr>),
	Ident(String),
	Unary {
		op: UnaryOp,
		expr: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		lhs: Box<Expr>,
		rhs: Box<Expr>,
	},
	Logical {
		op: LogicalOp,
		lhs: Box<Expr>,
		rhs: Box<Expr>,
	},
	Conditional {
		cond: Box<Expr>,
		then: Box<Expr>,
		otherwise: Box<Expr>,
	},
	Assign {
		op: AssignOp,
		target: Box<Expr>,
		value: Box<Expr>,
	},
	Update {
		target: Box<Expr>,
		increment: bool,
		prefix: bool,
	},
	Member {
		object: Box<Expr>,
		property: String,
	},
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
	},
	Call {
		callee: Box<Expr>,
		args: Vec<Expr>,
	},
	Function(Arc<FunctionDef>),
}

impl Expr {
	/// Returns true if the expression may appear on the left of `=`.
	pub fn is_assignable(&self) -> bool {
		matches!(self, Self::Ident(_) | Self::Index { .. })
	}
}
